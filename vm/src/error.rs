use std::io;

use pm0_bytecode::{CodecError, DecodeError};
use thiserror::Error;

/// Load-time and runtime failures. Every one of them stops the machine.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("memory size {0} must be between 1 and {max}", max = i32::MAX)]
    InvalidMemorySize(usize),
    #[error("program of {instructions} instructions does not fit in {memory_size} words")]
    ProgramTooLarge {
        instructions: usize,
        memory_size: usize,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("address {address} is outside memory")]
    AddressOutOfBounds { address: i32 },
    #[error("division by zero at {address}")]
    DivisionByZero { address: i32 },
    #[error("invalid opcode {op} at {address}")]
    InvalidOpcode { op: i32, address: i32 },
    #[error("invalid OPR modifier {code} at {address}")]
    InvalidOperation { code: i32, address: i32 },
    #[error("invalid SYS modifier {code} at {address}")]
    InvalidSyscall { code: i32, address: i32 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("machine has already halted")]
    Halted,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl VmError {
    /// Attach the address of the instruction that failed to decode.
    pub(crate) fn decode(err: DecodeError, address: i32) -> Self {
        match err {
            DecodeError::InvalidOpcode(op) => Self::InvalidOpcode { op, address },
            DecodeError::InvalidOperation(code) => Self::InvalidOperation { code, address },
            DecodeError::InvalidSyscall(code) => Self::InvalidSyscall { code, address },
        }
    }
}
