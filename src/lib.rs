// 16 8-bit data registers named V0 to VF
// I -> address register (12 bits)
//
// Stack of return addresses, 16 deep
//
// Delay timer & Sound timer: Count down at 60 times / s until 0
// Beep when sound timer is non-zero
//
// Display res: 64 width, 32 height
//
// 35 opcodes, each are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier

//! CHIP-8 interpreter core.
//!
//! [`Emulator`] owns memory, registers, the frame buffer, timers and the
//! keypad state. Rendering, audio and real key polling are left to the
//! caller: read [`Emulator::snapshot`], watch [`Emulator::sound_active`] and
//! feed key events into [`Emulator::keypad`].
//!
//! ```
//! use chip8vm::{CpuState, Emulator, Settings};
//!
//! let mut emu = Emulator::new(&Settings::default());
//! // LD V0, 0x2A ; ADD V0, 0x01
//! emu.load_program(&[0x60, 0x2A, 0x70, 0x01]).unwrap();
//! emu.cycle().unwrap();
//! assert_eq!(emu.cycle(), Ok(CpuState::Running));
//! assert_eq!(emu.regs.get(0), Ok(0x2B));
//! ```

pub mod config;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod timer;

pub use config::Settings;
pub use emulator::{CpuState, Emulator};
pub use error::{Chip8Error, Result};
