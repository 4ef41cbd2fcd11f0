use crate::error::{Chip8Error, Result};
use crate::memory::{TypeAddr, PROGRAM_START};

pub const FLAG_REGISTER: u8 = 0xF;
pub const STACK_DEPTH: usize = 16;

/// V0..VF, I, PC and the call stack.
pub struct Registers {
    registers: [u8; 16],
    pub index: IndexRegister,
    pub pc: ProgramCounter,
    pub stack: Stack,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            registers: [0; 16],
            index: IndexRegister(0x0),
            pc: ProgramCounter(PROGRAM_START),
            stack: Stack::new(),
        }
    }

    fn slot(reg_num: u8) -> Result<usize> {
        if reg_num > 0xF {
            return Err(Chip8Error::InvalidRegisterIndex(reg_num));
        }
        Ok(reg_num as usize)
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) -> Result<()> {
        self.registers[Self::slot(reg_num)?] = value;
        Ok(())
    }

    pub fn get(&self, reg_num: u8) -> Result<u8> {
        Ok(self.registers[Self::slot(reg_num)?])
    }

    pub fn add_to_register(&mut self, reg_num: u8, value: u8) -> Result<()> {
        let slot = Self::slot(reg_num)?;
        self.registers[slot] = self.registers[slot].wrapping_add(value);
        Ok(())
    }

    // VF is never an operand for flag writes, only a side-effect target
    pub fn set_flag(&mut self, set: bool) {
        self.registers[FLAG_REGISTER as usize] = set as u8;
    }

    pub fn flag(&self) -> u8 {
        self.registers[FLAG_REGISTER as usize]
    }

    /// V0..=Vx, for the bulk store instruction.
    pub fn range(&self, last: u8) -> Result<&[u8]> {
        let end = Self::slot(last)?;
        Ok(&self.registers[..=end])
    }

    /// Copies `values` into V0 onwards.
    pub fn load_range(&mut self, values: &[u8]) -> Result<()> {
        if values.len() > self.registers.len() {
            return Err(Chip8Error::InvalidRegisterIndex(values.len() as u8 - 1));
        }
        self.registers[..values.len()].copy_from_slice(values);
        Ok(())
    }

    pub fn snapshot(&self) -> [u8; 16] {
        self.registers
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    pub fn skip(&mut self) {
        self.0 = self.0.wrapping_add(4);
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

/// Stored untruncated; address use sites validate against memory size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }

    pub fn offset(&mut self, by: u8) {
        self.0 = self.0.wrapping_add(by as TypeAddr);
    }
}

pub struct Stack {
    addresses: Vec<TypeAddr>,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: Vec::with_capacity(STACK_DEPTH),
        }
    }

    pub fn push(&mut self, addr: TypeAddr) -> Result<()> {
        if self.addresses.len() >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow);
        }
        self.addresses.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<TypeAddr> {
        self.addresses.pop().ok_or(Chip8Error::StackUnderflow)
    }

    pub fn is_full(&self) -> bool {
        self.addresses.len() >= STACK_DEPTH
    }

    pub fn depth(&self) -> usize {
        self.addresses.len()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
