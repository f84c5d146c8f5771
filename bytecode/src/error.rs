use thiserror::Error;

/// A raw instruction that does not name a valid operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode {0}")]
    InvalidOpcode(i32),
    #[error("invalid OPR modifier {0}")]
    InvalidOperation(i32),
    #[error("invalid SYS modifier {0}")]
    InvalidSyscall(i32),
}

/// The code buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("code array overflow (capacity {capacity})")]
pub struct CapacityError {
    pub capacity: usize,
}

/// Failure to read a serialized instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The file holds the marker a failed compilation writes instead of code.
    #[error("bytecode file records a compilation failure: {0}")]
    CompilationFailed(String),
    #[error("line {line}: expected `OP LEVEL MODIFIER`, found {text:?}")]
    Malformed { line: usize, text: String },
    #[error("line {line}: {text:?} is not an integer")]
    NotAnInteger { line: usize, text: String },
    #[error("binary stream of {len} bytes is not a whole number of instructions")]
    Truncated { len: usize },
    #[error("instruction {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },
}
