use crate::error::{Chip8Error, Result};

pub const KEY_COUNT: u8 = 16;

/// Which of the 16 hex keys were down at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet(u16);

impl KeySet {
    pub fn is_pressed(&self, key: u8) -> bool {
        key < KEY_COUNT && self.0 & (1 << key) != 0
    }
}

/// Key state shared with the input source. The input side calls
/// `key_down`/`key_up`/`request_quit`; the interpreter only reads.
#[derive(Debug, Default)]
pub struct Keypad {
    keys: KeySet,
    // first key-down seen since the last take
    pending: Option<u8>,
    quit: bool,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn check(key: u8) -> Result<u8> {
        if key >= KEY_COUNT {
            return Err(Chip8Error::InvalidRegisterIndex(key));
        }
        Ok(key)
    }

    pub fn key_down(&mut self, key: u8) -> Result<()> {
        let key = Self::check(key)?;
        if !self.keys.is_pressed(key) && self.pending.is_none() {
            self.pending = Some(key);
        }
        self.keys.0 |= 1 << key;
        Ok(())
    }

    pub fn key_up(&mut self, key: u8) -> Result<()> {
        let key = Self::check(key)?;
        self.keys.0 &= !(1 << key);
        Ok(())
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.is_pressed(key)
    }

    /// Copy of the current key set, read once per cycle.
    pub fn snapshot(&self) -> KeySet {
        self.keys
    }

    /// Consumes the latched key-down event, if any.
    pub fn take_key_press(&mut self) -> Option<u8> {
        self.pending.take()
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}
