use std::path::PathBuf;

// CPU: 700 times per second
// Timer: 60 times per second
pub const DEFAULT_CYCLES_PER_SECOND: u32 = 700;
pub const DEFAULT_TIMER_HZ: u32 = 60;
pub const DEFAULT_SCALE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cycles_per_second: u32,
    pub timer_hz: u32,
    /// Window pixels per CHIP-8 pixel.
    pub scale: usize,
    pub rom_path: Option<PathBuf>,
}

impl Settings {
    pub fn new(cycles_per_second: u32, timer_hz: u32, rom_path: Option<PathBuf>) -> Self {
        Self {
            cycles_per_second,
            timer_hz,
            rom_path,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: usize) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
            timer_hz: DEFAULT_TIMER_HZ,
            scale: DEFAULT_SCALE,
            rom_path: None,
        }
    }
}
