use std::fmt;

use crate::error::{Chip8Error, Result};
use crate::memory::TypeAddr;

/// A fetched 16-bit instruction word and its operand fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInstruction {
    code: u16,
}

impl RawInstruction {
    pub fn new(code: u16) -> Self {
        RawInstruction { code }
    }

    pub fn op_class(&self) -> u16 {
        self.code & 0xF000
    }

    pub fn x(&self) -> u8 {
        ((self.code & 0x0F00) >> 8) as u8
    }

    pub fn y(&self) -> u8 {
        ((self.code & 0x00F0) >> 4) as u8
    }

    pub fn n(&self) -> u8 {
        (self.code & 0x000F) as u8
    }

    pub fn nn(&self) -> u8 {
        (self.code & 0x00FF) as u8
    }

    pub fn nnn(&self) -> TypeAddr {
        self.code & 0x0FFF
    }
}

impl PartialEq<u16> for RawInstruction {
    fn eq(&self, ins: &u16) -> bool {
        ins.eq(&self.code)
    }
}

#[test]
fn test_bit_manip() {
    let raw = RawInstruction::new(0x4CEE);
    assert_eq!(raw.op_class(), 0x4000);
    assert_eq!(raw.x(), 0xC);
    assert_eq!(raw.y(), 0xE);
    assert_eq!(raw.n(), 0xE);
    assert_eq!(raw.nn(), 0xEE);
    assert_eq!(raw.nnn(), 0xCEE);
    assert_eq!(raw, 0x4CEE);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // 00E0
    // turn all pixels to 0
    ClearScreen,
    // 00EE
    PopSubroutine,
    // 1NNN
    // set PC to address NNN, "jump" to memory location
    Jump(TypeAddr),
    // 2NNN
    PushSubroutine(TypeAddr),

    // 3XNN
    SkipEqualConstant(u8, u8),
    // 4XNN
    SkipNotEqualConstant(u8, u8),
    // 5XY0
    SkipEqualRegister(u8, u8),
    // 9XY0
    SkipNotEqualRegister(u8, u8),

    // 6XNN
    SetRegister(u8, u8),
    // 7XNN
    // add value NN to VX, no carry
    AddToRegister(u8, u8),

    // 8XY0
    CopyRegister(u8, u8),
    // 8XY1
    Or(u8, u8),
    // 8XY2
    And(u8, u8),
    // 8XY3
    XOr(u8, u8),
    /// 8XY4
    Add(u8, u8),
    // 8XY5
    SubtractForward(u8, u8),
    // 8XY6
    RightShift(u8, u8),
    // 8XY7
    SubtractBackward(u8, u8),
    // 8XYE
    LeftShift(u8, u8),

    // ANNN
    SetIndexRegister(TypeAddr),
    // BNNN
    JumpWithOffset(TypeAddr),
    // CXNN
    Random(u8, u8),
    // DXYN
    // draw an N pixel tall sprite starting at I at (VX, VY),
    // VF = 1 if any lit pixel got switched off
    Display(u8, u8, u8),

    // EX9E
    SkipIfPressed(u8),
    // EXA1
    SkipIfNotPressed(u8),

    // FX07
    CopyDelayToRegister(u8),
    // FX0A
    GetKey(u8),
    // FX15
    CopyRegisterToDelay(u8),
    // FX18
    CopyRegisterToSound(u8),
    // FX1E
    AddToIndex(u8),
    // FX29
    PointChar(u8),
    // FX33
    ToDecimal(u8),
    // FX55
    StoreRegisterToMemory(u8),
    // FX65
    LoadRegisterFromMemory(u8),
}

impl Instruction {
    /// Maps an opcode to its instruction using the class nibble, plus the
    /// low nibble/byte for the 0, 8, E and F groups.
    pub fn decode(ins: u16) -> Result<Self> {
        let raw = RawInstruction::new(ins);
        let (x, y) = (raw.x(), raw.y());

        let decoded = match raw.op_class() {
            0x0000 => match ins {
                0x00E0 => Self::ClearScreen,
                0x00EE => Self::PopSubroutine,
                _ => return Err(Chip8Error::UnimplementedOpcode(ins)),
            },
            0x1000 => Self::Jump(raw.nnn()),
            0x2000 => Self::PushSubroutine(raw.nnn()),
            0x3000 => Self::SkipEqualConstant(x, raw.nn()),
            0x4000 => Self::SkipNotEqualConstant(x, raw.nn()),
            0x5000 if raw.n() == 0 => Self::SkipEqualRegister(x, y),
            0x6000 => Self::SetRegister(x, raw.nn()),
            0x7000 => Self::AddToRegister(x, raw.nn()),
            0x8000 => match raw.n() {
                0x0 => Self::CopyRegister(x, y),
                0x1 => Self::Or(x, y),
                0x2 => Self::And(x, y),
                0x3 => Self::XOr(x, y),
                0x4 => Self::Add(x, y),
                0x5 => Self::SubtractForward(x, y),
                0x6 => Self::RightShift(x, y),
                0x7 => Self::SubtractBackward(x, y),
                0xE => Self::LeftShift(x, y),
                _ => return Err(Chip8Error::UnimplementedOpcode(ins)),
            },
            0x9000 if raw.n() == 0 => Self::SkipNotEqualRegister(x, y),
            0xA000 => Self::SetIndexRegister(raw.nnn()),
            0xB000 => Self::JumpWithOffset(raw.nnn()),
            0xC000 => Self::Random(x, raw.nn()),
            0xD000 => Self::Display(x, y, raw.n()),
            0xE000 => match raw.nn() {
                0x9E => Self::SkipIfPressed(x),
                0xA1 => Self::SkipIfNotPressed(x),
                _ => return Err(Chip8Error::UnimplementedOpcode(ins)),
            },
            0xF000 => match raw.nn() {
                0x07 => Self::CopyDelayToRegister(x),
                0x0A => Self::GetKey(x),
                0x15 => Self::CopyRegisterToDelay(x),
                0x18 => Self::CopyRegisterToSound(x),
                0x1E => Self::AddToIndex(x),
                0x29 => Self::PointChar(x),
                0x33 => Self::ToDecimal(x),
                0x55 => Self::StoreRegisterToMemory(x),
                0x65 => Self::LoadRegisterFromMemory(x),
                _ => return Err(Chip8Error::UnimplementedOpcode(ins)),
            },
            _ => return Err(Chip8Error::UnimplementedOpcode(ins)),
        };
        Ok(decoded)
    }
}

// assembler-style mnemonics, used in trace logs
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            PopSubroutine => write!(f, "RET"),
            Jump(addr) => write!(f, "JP {addr:#05X}"),
            PushSubroutine(addr) => write!(f, "CALL {addr:#05X}"),
            SkipEqualConstant(x, nn) => write!(f, "SE V{x:X}, {nn:#04X}"),
            SkipNotEqualConstant(x, nn) => write!(f, "SNE V{x:X}, {nn:#04X}"),
            SkipEqualRegister(x, y) => write!(f, "SE V{x:X}, V{y:X}"),
            SkipNotEqualRegister(x, y) => write!(f, "SNE V{x:X}, V{y:X}"),
            SetRegister(x, nn) => write!(f, "LD V{x:X}, {nn:#04X}"),
            AddToRegister(x, nn) => write!(f, "ADD V{x:X}, {nn:#04X}"),
            CopyRegister(x, y) => write!(f, "LD V{x:X}, V{y:X}"),
            Or(x, y) => write!(f, "OR V{x:X}, V{y:X}"),
            And(x, y) => write!(f, "AND V{x:X}, V{y:X}"),
            XOr(x, y) => write!(f, "XOR V{x:X}, V{y:X}"),
            Add(x, y) => write!(f, "ADD V{x:X}, V{y:X}"),
            SubtractForward(x, y) => write!(f, "SUB V{x:X}, V{y:X}"),
            RightShift(x, y) => write!(f, "SHR V{x:X}, V{y:X}"),
            SubtractBackward(x, y) => write!(f, "SUBN V{x:X}, V{y:X}"),
            LeftShift(x, y) => write!(f, "SHL V{x:X}, V{y:X}"),
            SetIndexRegister(addr) => write!(f, "LD I, {addr:#05X}"),
            JumpWithOffset(addr) => write!(f, "JP V0, {addr:#05X}"),
            Random(x, nn) => write!(f, "RND V{x:X}, {nn:#04X}"),
            Display(x, y, n) => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            SkipIfPressed(x) => write!(f, "SKP V{x:X}"),
            SkipIfNotPressed(x) => write!(f, "SKNP V{x:X}"),
            CopyDelayToRegister(x) => write!(f, "LD V{x:X}, DT"),
            GetKey(x) => write!(f, "LD V{x:X}, K"),
            CopyRegisterToDelay(x) => write!(f, "LD DT, V{x:X}"),
            CopyRegisterToSound(x) => write!(f, "LD ST, V{x:X}"),
            AddToIndex(x) => write!(f, "ADD I, V{x:X}"),
            PointChar(x) => write!(f, "LD F, V{x:X}"),
            ToDecimal(x) => write!(f, "LD B, V{x:X}"),
            StoreRegisterToMemory(x) => write!(f, "LD [I], V{x:X}"),
            LoadRegisterFromMemory(x) => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

#[test]
fn test_decode_groups() {
    use Instruction::*;
    let cases = [
        (0x00E0, ClearScreen),
        (0x00EE, PopSubroutine),
        (0x1ABC, Jump(0xABC)),
        (0x2300, PushSubroutine(0x300)),
        (0x3A12, SkipEqualConstant(0xA, 0x12)),
        (0x4B34, SkipNotEqualConstant(0xB, 0x34)),
        (0x5120, SkipEqualRegister(1, 2)),
        (0x6F00, SetRegister(0xF, 0x00)),
        (0x7401, AddToRegister(4, 1)),
        (0x8120, CopyRegister(1, 2)),
        (0x8121, Or(1, 2)),
        (0x8122, And(1, 2)),
        (0x8123, XOr(1, 2)),
        (0x8124, Add(1, 2)),
        (0x8125, SubtractForward(1, 2)),
        (0x8126, RightShift(1, 2)),
        (0x8127, SubtractBackward(1, 2)),
        (0x812E, LeftShift(1, 2)),
        (0x9340, SkipNotEqualRegister(3, 4)),
        (0xA123, SetIndexRegister(0x123)),
        (0xB200, JumpWithOffset(0x200)),
        (0xC5FF, Random(5, 0xFF)),
        (0xD125, Display(1, 2, 5)),
        (0xE39E, SkipIfPressed(3)),
        (0xE3A1, SkipIfNotPressed(3)),
        (0xF207, CopyDelayToRegister(2)),
        (0xF20A, GetKey(2)),
        (0xF215, CopyRegisterToDelay(2)),
        (0xF218, CopyRegisterToSound(2)),
        (0xF21E, AddToIndex(2)),
        (0xF229, PointChar(2)),
        (0xF233, ToDecimal(2)),
        (0xF255, StoreRegisterToMemory(2)),
        (0xF265, LoadRegisterFromMemory(2)),
    ];
    for (op, expected) in cases {
        assert_eq!(Instruction::decode(op), Ok(expected), "opcode {op:04X}");
    }
}

#[test]
fn test_decode_rejects_unknown_patterns() {
    for op in [0x0000, 0x0123, 0x00E1, 0x5555, 0x8008, 0x800F, 0x9001, 0xE000, 0xF000, 0xF0FF] {
        assert_eq!(
            Instruction::decode(op),
            Err(Chip8Error::UnimplementedOpcode(op)),
            "opcode {op:04X}"
        );
    }
}

#[test]
fn test_mnemonics() {
    assert_eq!(Instruction::Add(1, 0xA).to_string(), "ADD V1, VA");
    assert_eq!(Instruction::Jump(0x2A4).to_string(), "JP 0x2A4");
    assert_eq!(Instruction::Display(0, 1, 15).to_string(), "DRW V0, V1, 15");
}
