//! Desktop front end: a minifb window for the screen and keypad, a cpal
//! beeper for the sound timer.
//!
//! ```bash
//! RUST_LOG=info chip8vm --rom roms/ibm-logo.ch8 --ips 700
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chip8vm::config::{DEFAULT_CYCLES_PER_SECOND, DEFAULT_SCALE, DEFAULT_TIMER_HZ};
use chip8vm::{CpuState, Emulator, Settings};
use clap::Parser;
use log::{error, info, warn};

mod screen;
mod sound;

use screen::Screen;
use sound::Beeper;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, help = "Path to the ROM file to run")]
    rom: PathBuf,

    #[arg(short, long, default_value_t = DEFAULT_CYCLES_PER_SECOND, help = "Instructions per second")]
    ips: u32,

    #[arg(short, long, default_value_t = DEFAULT_TIMER_HZ, help = "Delay/sound timer rate in Hz")]
    timer_hz: u32,

    #[arg(short, long, default_value_t = DEFAULT_SCALE, help = "Window pixels per CHIP-8 pixel")]
    scale: usize,

    #[arg(long, help = "Step over unknown opcodes instead of stopping")]
    skip_unknown: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = Settings::new(args.ips, args.timer_hz, Some(args.rom)).with_scale(args.scale);

    let skip_unknown = args.skip_unknown;
    let mut emu = Emulator::new(&settings);
    if let Some(path) = &settings.rom_path {
        let program =
            fs::read(path).with_context(|| format!("reading ROM {}", path.display()))?;
        emu.load_program(&program)?;
    }

    let mut screen = Screen::new(settings.scale)?;
    let mut beeper = match Beeper::new() {
        Ok(beeper) => Some(beeper),
        Err(err) => {
            warn!("audio disabled: {err:#}");
            None
        }
    };

    let mut last = Instant::now();
    while emu.is_running() {
        screen.poll_keys(&mut emu.keypad)?;

        let now = Instant::now();
        let state = match emu.advance(now - last) {
            Ok(state) => state,
            Err(err) if skip_unknown && err.is_decode_error() => {
                warn!("{err}, skipping");
                emu.skip_instruction()?;
                emu.state()
            }
            Err(err) => {
                error!("stopping: {err}");
                return Err(err.into());
            }
        };
        last = now;

        if let Some(beeper) = beeper.as_mut() {
            beeper.set_active(emu.sound_active())?;
        }
        if state == CpuState::Halted {
            break;
        }
        screen.draw(&emu.snapshot())?;
    }

    info!("exiting");
    Ok(())
}
