use core::fmt;

use crate::error::DecodeError;
use crate::op::{Op, Opr, Syscall};

/// Number of memory words one instruction occupies.
pub const WORDS_PER_INSTRUCTION: i32 = 3;

/// Word address of the instruction at `index` in generation order.
pub const fn word_address(index: usize) -> i32 {
    index as i32 * WORDS_PER_INSTRUCTION
}

/// Instruction index addressed by a word address, if it is aligned.
pub fn instruction_index(address: i32) -> Option<usize> {
    if address < 0 || address % WORDS_PER_INSTRUCTION != 0 {
        return None;
    }
    usize::try_from(address / WORDS_PER_INSTRUCTION).ok()
}

/// An instruction exactly as it is stored: `(op, level, modifier)`.
///
/// This is the unit of serialization and of machine memory. It is not
/// validated; [`Instruction::decode`] does that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawInstruction {
    pub op: i32,
    pub level: i32,
    pub modifier: i32,
}

impl RawInstruction {
    pub const fn new(op: i32, level: i32, modifier: i32) -> Self {
        Self {
            op,
            level,
            modifier,
        }
    }
}

impl fmt::Display for RawInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.op, self.level, self.modifier)
    }
}

/// A decoded instruction.
///
/// Only the operands an opcode actually uses are kept; the level word of
/// `LIT`, `OPR`, `INC`, `JMP`, `JPC` and `SYS` is always encoded as `0`.
/// Code targets are word addresses (`3 × instruction index`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Lit { value: i32 },
    Opr { opr: Opr },
    Lod { level: i32, offset: i32 },
    Sto { level: i32, offset: i32 },
    Cal { level: i32, target: i32 },
    Inc { count: i32 },
    Jmp { target: i32 },
    Jpc { target: i32 },
    Sys { call: Syscall },
}

impl Instruction {
    pub const fn op(&self) -> Op {
        match self {
            Self::Lit { .. } => Op::Lit,
            Self::Opr { .. } => Op::Opr,
            Self::Lod { .. } => Op::Lod,
            Self::Sto { .. } => Op::Sto,
            Self::Cal { .. } => Op::Cal,
            Self::Inc { .. } => Op::Inc,
            Self::Jmp { .. } => Op::Jmp,
            Self::Jpc { .. } => Op::Jpc,
            Self::Sys { .. } => Op::Sys,
        }
    }

    pub const fn level(&self) -> i32 {
        match self {
            Self::Lod { level, .. } | Self::Sto { level, .. } | Self::Cal { level, .. } => *level,
            _ => 0,
        }
    }

    pub const fn modifier(&self) -> i32 {
        match self {
            Self::Lit { value } => *value,
            Self::Opr { opr } => opr.code(),
            Self::Lod { offset, .. } | Self::Sto { offset, .. } => *offset,
            Self::Cal { target, .. } | Self::Jmp { target } | Self::Jpc { target } => *target,
            Self::Inc { count } => *count,
            Self::Sys { call } => call.code(),
        }
    }

    /// The mnemonic shown in traces: `OPR` is named after its sub-operation.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Opr { opr } => opr.mnemonic(),
            _ => self.op().mnemonic(),
        }
    }

    /// The code word address this instruction transfers control to.
    pub const fn target(&self) -> Option<i32> {
        match self {
            Self::Cal { target, .. } | Self::Jmp { target } | Self::Jpc { target } => Some(*target),
            _ => None,
        }
    }

    pub(crate) fn set_target(&mut self, address: i32) {
        match self {
            Self::Cal { target, .. } | Self::Jmp { target } | Self::Jpc { target } => {
                *target = address
            }
            other => debug_assert!(false, "{other} has no code target"),
        }
    }

    pub const fn encode(&self) -> RawInstruction {
        RawInstruction::new(self.op().code(), self.level(), self.modifier())
    }

    pub fn decode(raw: RawInstruction) -> Result<Self, DecodeError> {
        let op = Op::try_from(raw.op).map_err(DecodeError::InvalidOpcode)?;
        let (level, m) = (raw.level, raw.modifier);
        Ok(match op {
            Op::Lit => Self::Lit { value: m },
            Op::Opr => Self::Opr {
                opr: Opr::try_from(m).map_err(DecodeError::InvalidOperation)?,
            },
            Op::Lod => Self::Lod { level, offset: m },
            Op::Sto => Self::Sto { level, offset: m },
            Op::Cal => Self::Cal { level, target: m },
            Op::Inc => Self::Inc { count: m },
            Op::Jmp => Self::Jmp { target: m },
            Op::Jpc => Self::Jpc { target: m },
            Op::Sys => Self::Sys {
                call: Syscall::try_from(m).map_err(DecodeError::InvalidSyscall)?,
            },
        })
    }
}

impl From<Instruction> for RawInstruction {
    fn from(instruction: Instruction) -> Self {
        instruction.encode()
    }
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = DecodeError;

    fn try_from(raw: RawInstruction) -> Result<Self, DecodeError> {
        Instruction::decode(raw)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name(), self.level(), self.modifier())
    }
}
