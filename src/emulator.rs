use std::time::Duration;

use log::{debug, error, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    config::Settings,
    decode::Instruction,
    display::{FrameBuffer, Grid},
    error::{Chip8Error, Result},
    keyboard::Keypad,
    memory::{Memory, TypeAddr},
    registers::Registers,
    timer::{Due, Pacer, Timer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    Running,
    /// Suspended on FX0A until a key-down event arrives for `register`.
    WaitingForKey { register: u8 },
    Halted,
}

// what an instruction does to PC once its effects are committed
enum Flow {
    Next,
    Skip,
    Jump(TypeAddr),
    Hold,
}

impl Flow {
    fn skip_if(cond: bool) -> Self {
        if cond {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

pub struct Emulator {
    fb: FrameBuffer,
    pub regs: Registers,
    pub mem: Memory,
    pub keypad: Keypad,
    pub delay_timer: Timer,
    pub sound_timer: Timer,
    state: CpuState,
    // the error that halted the machine, None for a requested halt
    halt_reason: Option<Chip8Error>,
    pacer: Pacer,
    rng: StdRng,
    program: Vec<u8>,
}

impl Emulator {
    pub fn new(settings: &Settings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Same as [`Emulator::new`] but with a reproducible CXNN sequence.
    pub fn with_seed(settings: &Settings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: &Settings, rng: StdRng) -> Self {
        Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::new(),
            keypad: Keypad::new(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            state: CpuState::Running,
            halt_reason: None,
            pacer: Pacer::new(settings.cycles_per_second, settings.timer_hz),
            rng,
            program: Vec::new(),
        }
    }

    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.mem.load_program(program)?;
        self.program = program.to_vec();
        Ok(())
    }

    /// Back to power-on state with the last loaded program in place.
    pub fn reset(&mut self) -> Result<()> {
        info!("resetting machine");
        self.fb.clear();
        self.regs = Registers::new();
        self.mem = Memory::new();
        self.keypad.reset();
        self.delay_timer = Timer::default();
        self.sound_timer = Timer::default();
        self.pacer.reset();
        self.state = CpuState::Running;
        self.halt_reason = None;
        let program = std::mem::take(&mut self.program);
        self.load_program(&program)
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state != CpuState::Halted
    }

    pub fn halt(&mut self) {
        if self.state != CpuState::Halted {
            debug!("halting at {:#05x}", self.regs.pc.0);
            self.state = CpuState::Halted;
        }
        self.halt_reason = None;
    }

    /// Why the machine halted, if an instruction failed.
    pub fn halt_reason(&self) -> Option<&Chip8Error> {
        self.halt_reason.as_ref()
    }

    /// Steps over the instruction at PC and resumes. Only allowed after a
    /// decode failure; any other halt fails with `NotResumable` and the
    /// machine stays halted.
    pub fn skip_instruction(&mut self) -> Result<()> {
        match &self.halt_reason {
            Some(err) if err.is_decode_error() => {
                warn!("skipping instruction at {:#05x}", self.regs.pc.0);
                self.regs.pc.increment();
                self.state = CpuState::Running;
                self.halt_reason = None;
                Ok(())
            }
            _ => Err(Chip8Error::NotResumable),
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn snapshot(&self) -> Grid {
        self.fb.snapshot()
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer.is_active()
    }

    pub fn fetch_decode(&self) -> Result<(u16, Instruction)> {
        let code = self.mem.read16(self.regs.pc.0)?;
        Ok((code, Instruction::decode(code)?))
    }

    /// Interprets exactly one instruction, or polls for the awaited key
    /// while suspended. Any error halts the machine and is handed back.
    pub fn cycle(&mut self) -> Result<CpuState> {
        match self.state {
            CpuState::Halted => {}
            CpuState::WaitingForKey { register } => {
                if let Some(key) = self.keypad.take_key_press() {
                    debug!("key {key:X} pressed, resuming");
                    self.regs.set_register(register, key)?;
                    self.regs.pc.increment();
                    self.state = CpuState::Running;
                }
            }
            CpuState::Running => {
                let pc = self.regs.pc.0;
                let result = self.fetch_decode().and_then(|(code, ins)| {
                    trace!("{pc:#05x}: {code:04X} {ins}");
                    self.execute_ins(ins)
                });
                if let Err(err) = result {
                    error!("halted at {pc:#05x}: {err}");
                    self.state = CpuState::Halted;
                    self.halt_reason = Some(err.clone());
                    return Err(err);
                }
            }
        }
        Ok(self.state)
    }

    /// One 60Hz tick: decrement both timers. Frozen while waiting for a key.
    pub fn tick_timers(&mut self) {
        if self.state != CpuState::Running {
            return;
        }
        self.delay_timer.tick();
        if self.sound_timer.tick() {
            debug!("sound timer expired");
        }
    }

    /// Outer-loop helper: checks for quit, then runs however many cycles and
    /// timer ticks `elapsed` is worth. Ticks are spread evenly over the
    /// cycles, so a slice that stops partway still ticks for the part that ran.
    pub fn advance(&mut self, elapsed: Duration) -> Result<CpuState> {
        if self.keypad.quit_requested() {
            info!("quit requested");
            self.halt();
            return Ok(self.state);
        }
        let Due {
            cycles,
            timer_ticks,
        } = self.pacer.advance(elapsed);
        let mut ticked = 0;
        for n in 1..=cycles {
            let state = self.cycle()?;
            let owed = timer_ticks * n / cycles;
            while ticked < owed {
                self.tick_timers();
                ticked += 1;
            }
            if state != CpuState::Running {
                return Ok(state);
            }
        }
        // slices shorter than one cycle still tick
        for _ in ticked..timer_ticks {
            self.tick_timers();
        }
        Ok(self.state)
    }

    pub fn execute_ins(&mut self, ins: Instruction) -> Result<()> {
        let keys = self.keypad.snapshot();
        let flow = match ins {
            Instruction::ClearScreen => {
                self.fb.clear();
                Flow::Next
            }
            Instruction::PopSubroutine => Flow::Jump(self.regs.stack.pop()?),
            Instruction::Jump(addr) => Flow::Jump(addr),
            Instruction::PushSubroutine(addr) => {
                // return to the instruction after the call
                self.regs.stack.push(self.regs.pc.0.wrapping_add(2))?;
                Flow::Jump(addr)
            }
            Instruction::SkipEqualConstant(vx, nn) => Flow::skip_if(self.regs.get(vx)? == nn),
            Instruction::SkipNotEqualConstant(vx, nn) => Flow::skip_if(self.regs.get(vx)? != nn),
            Instruction::SkipEqualRegister(vx, vy) => {
                Flow::skip_if(self.regs.get(vx)? == self.regs.get(vy)?)
            }
            Instruction::SkipNotEqualRegister(vx, vy) => {
                Flow::skip_if(self.regs.get(vx)? != self.regs.get(vy)?)
            }
            Instruction::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn)?;
                Flow::Next
            }
            Instruction::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn)?;
                Flow::Next
            }
            Instruction::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy)?)?;
                Flow::Next
            }
            Instruction::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx)? | self.regs.get(vy)?)?;
                Flow::Next
            }
            Instruction::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx)? & self.regs.get(vy)?)?;
                Flow::Next
            }
            Instruction::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx)? ^ self.regs.get(vy)?)?;
                Flow::Next
            }
            // flag first, result last: with x = F the result wins
            Instruction::Add(vx, vy) => {
                let (x, y) = (self.regs.get(vx)?, self.regs.get(vy)?);
                let (sum, carry) = x.overflowing_add(y);
                self.regs.set_flag(carry);
                self.regs.set_register(vx, sum)?;
                Flow::Next
            }
            Instruction::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx)?, self.regs.get(vy)?);
                self.regs.set_flag(x >= y); // no borrow
                self.regs.set_register(vx, x.wrapping_sub(y))?;
                Flow::Next
            }
            Instruction::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx)?, self.regs.get(vy)?);
                self.regs.set_flag(y >= x);
                self.regs.set_register(vx, y.wrapping_sub(x))?;
                Flow::Next
            }
            Instruction::RightShift(vx, vy) => {
                // vx is checked before VF is touched
                let (_, y) = (self.regs.get(vx)?, self.regs.get(vy)?);
                self.regs.set_flag(y & 1 == 1);
                self.regs.set_register(vx, y >> 1)?;
                Flow::Next
            }
            Instruction::LeftShift(vx, vy) => {
                let (_, y) = (self.regs.get(vx)?, self.regs.get(vy)?);
                self.regs.set_flag((y >> 7) & 1 == 1);
                self.regs.set_register(vx, y << 1)?;
                Flow::Next
            }
            Instruction::SetIndexRegister(addr) => {
                self.regs.index.set_addr(addr);
                Flow::Next
            }
            Instruction::JumpWithOffset(addr) => {
                Flow::Jump(addr + self.regs.get(0)? as TypeAddr)
            }
            Instruction::Random(vx, nn) => {
                let ransuu: u8 = self.rng.gen();
                self.regs.set_register(vx, ransuu & nn)?;
                Flow::Next
            }
            Instruction::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x)?, self.regs.get(reg_y)?);
                let sprite = self.mem.read_range(self.regs.index.0, height as usize)?;
                let collision = self.fb.draw_sprite(x, y, sprite);
                self.regs.set_flag(collision);
                Flow::Next
            }
            Instruction::SkipIfPressed(vx) => Flow::skip_if(keys.is_pressed(self.regs.get(vx)?)),
            Instruction::SkipIfNotPressed(vx) => {
                Flow::skip_if(!keys.is_pressed(self.regs.get(vx)?))
            }
            Instruction::CopyDelayToRegister(vx) => {
                self.regs.set_register(vx, self.delay_timer.get())?;
                Flow::Next
            }
            Instruction::GetKey(vx) => {
                self.regs.get(vx)?;
                // only key-downs from now on count
                self.keypad.clear_pending();
                self.state = CpuState::WaitingForKey { register: vx };
                debug!("waiting for key into V{vx:X}");
                Flow::Hold
            }
            Instruction::CopyRegisterToDelay(vx) => {
                self.delay_timer.set(self.regs.get(vx)?);
                Flow::Next
            }
            Instruction::CopyRegisterToSound(vx) => {
                self.sound_timer.set(self.regs.get(vx)?);
                Flow::Next
            }
            Instruction::AddToIndex(vx) => {
                let value = self.regs.get(vx)?;
                self.regs.index.offset(value);
                Flow::Next
            }
            Instruction::PointChar(vx) => {
                let digit = self.regs.get(vx)?;
                self.regs.index.set_addr(Memory::font_address(digit));
                Flow::Next
            }
            Instruction::ToDecimal(vx) => {
                let value = self.regs.get(vx)?;
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.mem.write_range(self.regs.index.0, &digits)?;
                Flow::Next
            }
            Instruction::StoreRegisterToMemory(vx) => {
                self.mem
                    .write_range(self.regs.index.0, self.regs.range(vx)?)?;
                Flow::Next
            }
            Instruction::LoadRegisterFromMemory(vx) => {
                let values = self.mem.read_range(self.regs.index.0, vx as usize + 1)?;
                self.regs.load_range(values)?;
                Flow::Next
            }
        };

        match flow {
            Flow::Next => self.regs.pc.increment(),
            Flow::Skip => self.regs.pc.skip(),
            Flow::Jump(addr) => self.regs.pc.set_addr(addr),
            Flow::Hold => {}
        }
        Ok(())
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{HEIGHT, WIDTH};
    use crate::error::Chip8Error;
    use crate::registers::STACK_DEPTH;

    fn emu_with(program: &[u16]) -> Emulator {
        let bytes: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
        let mut emu = Emulator::with_seed(&Settings::default(), 7);
        emu.load_program(&bytes).unwrap();
        emu
    }

    fn run(emu: &mut Emulator, cycles: usize) {
        for _ in 0..cycles {
            emu.cycle().unwrap();
        }
    }

    fn v(emu: &Emulator, reg: u8) -> u8 {
        emu.regs.get(reg).unwrap()
    }

    #[test]
    fn load_then_add_wraps() {
        for x in 0..=0xF {
            let mut emu = emu_with(&[0x60C8 | (x as u16) << 8, 0x7064 | (x as u16) << 8]);
            run(&mut emu, 2);
            assert_eq!(v(&emu, x), ((200u16 + 100) % 256) as u8);
            assert_eq!(emu.regs.pc.0, 0x204);
        }
    }

    #[test]
    fn add_sets_carry() {
        let mut emu = emu_with(&[0x60FF, 0x6101, 0x8014]);
        run(&mut emu, 3);
        assert_eq!(v(&emu, 0), 0x00);
        assert_eq!(v(&emu, 0xF), 1);

        let mut emu = emu_with(&[0x6001, 0x6101, 0x6F01, 0x8014]);
        run(&mut emu, 4);
        assert_eq!(v(&emu, 0), 0x02);
        assert_eq!(v(&emu, 0xF), 0);
    }

    #[test]
    fn subtract_sets_no_borrow() {
        let mut emu = emu_with(&[0x6001, 0x6102, 0x8015]);
        run(&mut emu, 3);
        assert_eq!(v(&emu, 0), 0xFF);
        assert_eq!(v(&emu, 0xF), 0);

        let mut emu = emu_with(&[0x6002, 0x6101, 0x8015]);
        run(&mut emu, 3);
        assert_eq!(v(&emu, 0), 0x01);
        assert_eq!(v(&emu, 0xF), 1);

        // equal operands don't borrow
        let mut emu = emu_with(&[0x6005, 0x6105, 0x8015]);
        run(&mut emu, 3);
        assert_eq!(v(&emu, 0), 0);
        assert_eq!(v(&emu, 0xF), 1);
    }

    #[test]
    fn subtract_backward() {
        let mut emu = emu_with(&[0x6003, 0x6101, 0x8017]);
        run(&mut emu, 3);
        assert_eq!(v(&emu, 0), 0xFE);
        assert_eq!(v(&emu, 0xF), 0);

        let mut emu = emu_with(&[0x6001, 0x6103, 0x8017]);
        run(&mut emu, 3);
        assert_eq!(v(&emu, 0), 0x02);
        assert_eq!(v(&emu, 0xF), 1);
    }

    #[test]
    fn shifts_read_vy_and_flag_vf() {
        let mut emu = emu_with(&[0x6105, 0x8016]);
        run(&mut emu, 2);
        assert_eq!(v(&emu, 0), 0x02);
        assert_eq!(v(&emu, 1), 0x05);
        assert_eq!(v(&emu, 0xF), 1);

        let mut emu = emu_with(&[0x6181, 0x801E]);
        run(&mut emu, 2);
        assert_eq!(v(&emu, 0), 0x02);
        assert_eq!(v(&emu, 0xF), 1);

        let mut emu = emu_with(&[0x6140, 0x801E]);
        run(&mut emu, 2);
        assert_eq!(v(&emu, 0), 0x80);
        assert_eq!(v(&emu, 0xF), 0);
    }

    #[test]
    fn flag_lands_in_vf_not_operand() {
        // ADD V1, V2 with carry: V1 keeps the sum, only VF gets the flag
        let mut emu = emu_with(&[0x61F0, 0x6220, 0x8124]);
        run(&mut emu, 3);
        assert_eq!(v(&emu, 1), 0x10);
        assert_eq!(v(&emu, 2), 0x20);
        assert_eq!(v(&emu, 0xF), 1);
    }

    #[test]
    fn bitwise_ops() {
        let mut emu = emu_with(&[0x600C, 0x610A, 0x8010, 0x620C, 0x8211, 0x630C, 0x8312, 0x640C, 0x8413]);
        run(&mut emu, 9);
        assert_eq!(v(&emu, 0), 0x0A);
        assert_eq!(v(&emu, 2), 0x0E);
        assert_eq!(v(&emu, 3), 0x08);
        assert_eq!(v(&emu, 4), 0x06);
    }

    #[test]
    fn skips() {
        let mut emu = emu_with(&[0x6042, 0x3042]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.pc.0, 0x206);

        let mut emu = emu_with(&[0x6042, 0x3043]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.pc.0, 0x204);

        let mut emu = emu_with(&[0x6042, 0x4043]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.pc.0, 0x206);

        let mut emu = emu_with(&[0x6042, 0x6142, 0x5010, 0x0000, 0x9010]);
        run(&mut emu, 4);
        assert_eq!(emu.regs.pc.0, 0x20A);
    }

    #[test]
    fn call_and_return() {
        let mut emu = emu_with(&[0x2206, 0x6001, 0x0000, 0x610A, 0x00EE]);
        run(&mut emu, 1);
        assert_eq!(emu.regs.pc.0, 0x206);
        assert_eq!(emu.regs.stack.depth(), 1);
        run(&mut emu, 2);
        assert_eq!(emu.regs.pc.0, 0x202);
        assert_eq!(emu.regs.stack.depth(), 0);
        run(&mut emu, 1);
        assert_eq!(v(&emu, 0), 1);
        assert_eq!(v(&emu, 1), 0x0A);
    }

    #[test]
    fn jumps() {
        let mut emu = emu_with(&[0x1234]);
        run(&mut emu, 1);
        assert_eq!(emu.regs.pc.0, 0x234);

        let mut emu = emu_with(&[0x6010, 0xB300]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.pc.0, 0x310);
    }

    #[test]
    fn return_on_empty_stack_halts() {
        let mut emu = emu_with(&[0x00EE]);
        assert_eq!(emu.cycle(), Err(Chip8Error::StackUnderflow));
        assert_eq!(emu.state(), CpuState::Halted);
        assert_eq!(emu.regs.pc.0, 0x200);
        // halted machines stay put
        assert_eq!(emu.cycle(), Ok(CpuState::Halted));
    }

    #[test]
    fn runaway_recursion_overflows() {
        let mut emu = emu_with(&[0x2200]);
        run(&mut emu, STACK_DEPTH);
        assert_eq!(emu.cycle(), Err(Chip8Error::StackOverflow));
        assert_eq!(emu.regs.stack.depth(), STACK_DEPTH);
        assert!(!emu.is_running());
    }

    #[test]
    fn unimplemented_opcode_is_reported() {
        let mut emu = emu_with(&[0x5555, 0x6007]);
        assert_eq!(emu.cycle(), Err(Chip8Error::UnimplementedOpcode(0x5555)));
        assert_eq!(emu.state(), CpuState::Halted);

        assert_eq!(emu.halt_reason(), Some(&Chip8Error::UnimplementedOpcode(0x5555)));
        emu.skip_instruction().unwrap();
        assert_eq!(emu.halt_reason(), None);
        run(&mut emu, 1);
        assert_eq!(v(&emu, 0), 7);
    }

    #[test]
    fn fatal_errors_cannot_be_skipped() {
        let mut emu = emu_with(&[0x00EE, 0x6007]);
        assert_eq!(emu.cycle(), Err(Chip8Error::StackUnderflow));
        assert_eq!(emu.skip_instruction(), Err(Chip8Error::NotResumable));
        assert_eq!(emu.state(), CpuState::Halted);
        assert_eq!(emu.regs.pc.0, 0x200);
        assert_eq!(emu.cycle(), Ok(CpuState::Halted));
        assert_eq!(v(&emu, 0), 0);
    }

    #[test]
    fn quit_cannot_be_skipped() {
        let mut emu = emu_with(&[0x6009, 0x6109]);
        emu.keypad.request_quit();
        assert_eq!(emu.advance(Duration::from_secs(1)), Ok(CpuState::Halted));
        assert_eq!(emu.skip_instruction(), Err(Chip8Error::NotResumable));
        assert_eq!(emu.state(), CpuState::Halted);
        assert_eq!(emu.cycle(), Ok(CpuState::Halted));
        assert_eq!(v(&emu, 1), 0);
    }

    #[test]
    fn running_machine_cannot_skip() {
        let mut emu = emu_with(&[0x6001]);
        assert_eq!(emu.skip_instruction(), Err(Chip8Error::NotResumable));
        assert_eq!(emu.regs.pc.0, 0x200);
    }

    #[test]
    fn fetch_past_memory_end_halts() {
        let mut emu = emu_with(&[0x1FFF]);
        run(&mut emu, 1);
        assert_eq!(
            emu.cycle(),
            Err(Chip8Error::AddressOutOfRange { addr: 0xFFF, len: 2 })
        );
    }

    #[test]
    fn bcd() {
        let mut emu = emu_with(&[0x60EA, 0xA300, 0xF033]);
        run(&mut emu, 3);
        assert_eq!(emu.mem.read_range(0x300, 3).unwrap(), &[2, 3, 4]);

        let mut emu = emu_with(&[0x6007, 0xA300, 0xF033]);
        run(&mut emu, 3);
        assert_eq!(emu.mem.read_range(0x300, 3).unwrap(), &[0, 0, 7]);
    }

    #[test]
    fn bcd_out_of_range_writes_nothing() {
        let mut emu = emu_with(&[0x60FF, 0xAFFE, 0xF033]);
        run(&mut emu, 2);
        assert!(emu.cycle().is_err());
        assert_eq!(emu.mem.read_range(0xFFE, 2).unwrap(), &[0, 0]);
    }

    #[test]
    fn store_and_load_registers_round_trip() {
        let mut emu = emu_with(&[0x6011, 0x6122, 0x6233, 0x63FF, 0xA400, 0xF255, 0x6000, 0x6100, 0x6200, 0xF265]);
        run(&mut emu, 6);
        // inclusive of V2, V3 untouched
        assert_eq!(emu.mem.read_range(0x400, 4).unwrap(), &[0x11, 0x22, 0x33, 0x00]);
        run(&mut emu, 4);
        assert_eq!(&emu.regs.snapshot()[..4], &[0x11, 0x22, 0x33, 0xFF]);
        assert_eq!(emu.regs.index.0, 0x400);
    }

    #[test]
    fn index_ops() {
        let mut emu = emu_with(&[0xA100, 0x6020, 0xF01E]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.index.0, 0x120);

        let mut emu = emu_with(&[0x600B, 0xF029]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.index.0, 0x50 + 0xB * 5);
    }

    #[test]
    fn draw_twice_restores_screen_and_collides() {
        let mut emu = emu_with(&[0x6005, 0x6103, 0x6A0A, 0xFA29, 0xD015, 0xD015]);
        run(&mut emu, 5);
        assert_eq!(v(&emu, 0xF), 0);
        assert!(emu.frame_buffer().lit_pixels() > 0);
        run(&mut emu, 1);
        assert_eq!(v(&emu, 0xF), 1);
        assert_eq!(emu.frame_buffer().lit_pixels(), 0);
    }

    #[test]
    fn clear_screen_blanks_snapshot() {
        let mut emu = emu_with(&[0xF029, 0xD005, 0x00E0]);
        run(&mut emu, 2);
        assert!(emu.frame_buffer().lit_pixels() > 0);
        run(&mut emu, 1);
        assert_eq!(emu.snapshot(), [[false; WIDTH]; HEIGHT]);
    }

    #[test]
    fn random_is_masked() {
        let mut emu = emu_with(&[0xC00F, 0xC100]);
        run(&mut emu, 2);
        assert_eq!(v(&emu, 0) & 0xF0, 0);
        assert_eq!(v(&emu, 1), 0);
    }

    #[test]
    fn random_is_reproducible_with_seed() {
        let program = [0xC0FF, 0xC1FF, 0xC2FF];
        let mut a = emu_with(&program);
        let mut b = emu_with(&program);
        run(&mut a, 3);
        run(&mut b, 3);
        assert_eq!(a.regs.snapshot(), b.regs.snapshot());
    }

    #[test]
    fn key_skips_use_vx() {
        let mut emu = emu_with(&[0x6005, 0xE09E, 0x0000, 0xE0A1]);
        emu.keypad.key_down(5).unwrap();
        run(&mut emu, 2);
        assert_eq!(emu.regs.pc.0, 0x206);
        run(&mut emu, 1);
        assert_eq!(emu.regs.pc.0, 0x208);

        let mut emu = emu_with(&[0x6005, 0xE0A1]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.pc.0, 0x206);
    }

    #[test]
    fn wait_for_key_suspends() {
        let mut emu = emu_with(&[0x6020, 0xF015, 0xF30A, 0x6101]);
        // a key held before the wait doesn't count
        emu.keypad.key_down(0x2).unwrap();
        run(&mut emu, 3);
        assert_eq!(emu.state(), CpuState::WaitingForKey { register: 3 });
        assert_eq!(emu.regs.pc.0, 0x204);

        for _ in 0..10 {
            emu.tick_timers();
            assert_eq!(emu.cycle(), Ok(CpuState::WaitingForKey { register: 3 }));
        }
        assert_eq!(emu.delay_timer.get(), 0x20);
        assert_eq!(v(&emu, 1), 0);

        emu.keypad.key_down(0xE).unwrap();
        assert_eq!(emu.cycle(), Ok(CpuState::Running));
        assert_eq!(v(&emu, 3), 0xE);
        assert_eq!(emu.regs.pc.0, 0x206);
        run(&mut emu, 1);
        assert_eq!(v(&emu, 1), 1);
    }

    #[test]
    fn timers() {
        let mut emu = emu_with(&[0x6003, 0xF015, 0xF018, 0xF107]);
        run(&mut emu, 3);
        assert!(emu.sound_active());
        emu.tick_timers();
        run(&mut emu, 1);
        assert_eq!(v(&emu, 1), 2);
        emu.tick_timers();
        emu.tick_timers();
        emu.tick_timers();
        assert_eq!(emu.delay_timer.get(), 0);
        assert!(!emu.sound_active());
    }

    #[test]
    fn advance_decouples_cycles_from_ticks() {
        // 1NNN loop on itself
        let mut emu = emu_with(&[0x6078, 0xF015, 0x1204]);
        let state = emu.advance(Duration::from_secs(1)).unwrap();
        assert_eq!(state, CpuState::Running);
        // 700 cycles ran but the delay timer only lost 60
        assert_eq!(emu.delay_timer.get(), 0x78 - 60);
    }

    #[test]
    fn advance_ticks_until_key_wait() {
        // V1 counts to 200 (601 cycles), then FX0A at cycle 602
        let mut emu = emu_with(&[0x60FF, 0xF015, 0x7101, 0x31C8, 0x1204, 0xF20A]);
        let state = emu.advance(Duration::from_secs(1)).unwrap();
        assert_eq!(state, CpuState::WaitingForKey { register: 2 });
        // 60 * 601 / 700 ticks were owed before the wait began
        assert_eq!(emu.delay_timer.get(), 0xFF - 51);
    }

    #[test]
    fn advance_stops_on_quit() {
        let mut emu = emu_with(&[0x1200]);
        emu.keypad.request_quit();
        assert_eq!(emu.advance(Duration::from_secs(1)), Ok(CpuState::Halted));
        assert!(!emu.is_running());
    }

    #[test]
    fn advance_surfaces_errors() {
        let mut emu = emu_with(&[0x6001, 0x00EE]);
        assert_eq!(
            emu.advance(Duration::from_millis(100)),
            Err(Chip8Error::StackUnderflow)
        );
        assert_eq!(v(&emu, 0), 1);
        assert_eq!(emu.state(), CpuState::Halted);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut emu = emu_with(&[0x6042, 0xF029, 0xD005, 0x1206]);
        run(&mut emu, 4);
        emu.reset().unwrap();
        assert_eq!(emu.regs.pc.0, 0x200);
        assert_eq!(emu.regs.snapshot(), [0; 16]);
        assert_eq!(emu.frame_buffer().lit_pixels(), 0);
        assert_eq!(emu.mem.read16(0x200).unwrap(), 0x6042);
        run(&mut emu, 1);
        assert_eq!(v(&emu, 0), 0x42);
    }
}
