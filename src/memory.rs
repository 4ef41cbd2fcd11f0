use log::info;

use crate::error::{Chip8Error, Result};

pub type TypeAddr = u16; // in reality u12
type FontBytes = [u8; FONT_GLYPH_SIZE * 16];

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const FONT_BASE: TypeAddr = 0x50;
pub const FONT_GLYPH_SIZE: usize = 5;

const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

struct Font {
    data: FontBytes,
}

impl Default for Font {
    fn default() -> Self {
        Self { data: DEFAULT_FONT }
    }
}

/// Flat 4K address space.
///
/// 000 -> 04F is empty by convention, font glyphs live at 050 -> 09F and
/// programs are loaded from 200 onwards.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut mem = Self {
            bytes: [0; MEMORY_SIZE],
        };
        mem.load_font();
        mem
    }

    fn load_font(&mut self) {
        let font = Font::default();
        let start = FONT_BASE as usize;
        self.bytes[start..start + font.data.len()].copy_from_slice(&font.data);
    }

    // validates [addr, addr + len) and hands back the usize bounds
    fn span(addr: TypeAddr, len: usize) -> Result<(usize, usize)> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok((start, end)),
            _ => Err(Chip8Error::out_of_range(addr, len)),
        }
    }

    pub fn read8(&self, addr: TypeAddr) -> Result<u8> {
        let (start, _) = Self::span(addr, 1)?;
        Ok(self.bytes[start])
    }

    pub fn write8(&mut self, addr: TypeAddr, val: u8) -> Result<()> {
        let (start, _) = Self::span(addr, 1)?;
        self.bytes[start] = val;
        Ok(())
    }

    pub fn read_range(&self, addr: TypeAddr, len: usize) -> Result<&[u8]> {
        let (start, end) = Self::span(addr, len)?;
        Ok(&self.bytes[start..end])
    }

    /// Writes all of `data` or nothing at all.
    pub fn write_range(&mut self, addr: TypeAddr, data: &[u8]) -> Result<()> {
        let (start, end) = Self::span(addr, data.len())?;
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Big-endian instruction word at `addr`.
    pub fn read16(&self, addr: TypeAddr) -> Result<u16> {
        let word = self.read_range(addr, 2)?;
        Ok(((word[0] as u16) << 8) | word[1] as u16)
    }

    // loads program instructions starting at address 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let max = MEMORY_SIZE - PROGRAM_START as usize;
        if program.len() > max {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max,
            });
        }
        self.write_range(PROGRAM_START, program)?;
        info!("loaded {} program bytes at {:#05x}", program.len(), PROGRAM_START);
        Ok(())
    }

    pub fn font_address(digit: u8) -> TypeAddr {
        FONT_BASE + digit as TypeAddr * FONT_GLYPH_SIZE as TypeAddr
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
