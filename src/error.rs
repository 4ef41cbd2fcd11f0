use thiserror::Error;

use crate::memory::TypeAddr;

/// Everything that can stop the interpreter. None of these are transient,
/// retrying the same instruction gives the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("memory access out of range at {addr:#06X} (len {len})")]
    AddressOutOfRange { addr: usize, len: usize },

    #[error("invalid register index V{0:X}")]
    InvalidRegisterIndex(u8),

    #[error("stack overflow: call depth exceeded")]
    StackOverflow,

    #[error("stack underflow: return with empty call stack")]
    StackUnderflow,

    #[error("unimplemented opcode {0:#06X}")]
    UnimplementedOpcode(u16),

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("machine is halted and cannot resume")]
    NotResumable,
}

impl Chip8Error {
    /// Decode failures leave machine state untouched, so a caller may choose
    /// to step over them. Everything else means the state can't be trusted.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Chip8Error::UnimplementedOpcode(_))
    }

    pub(crate) fn out_of_range(addr: TypeAddr, len: usize) -> Self {
        Chip8Error::AddressOutOfRange {
            addr: addr as usize,
            len,
        }
    }
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
