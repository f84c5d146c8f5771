//! # PM/0 bytecode
//!
//! Instruction set of the PM/0 stack machine, a bounded builder that
//! resolves forward jumps by backpatching, and the flat text and binary
//! encodings shared by the compiler and the machine.
//!
//! Every code target is a *word address*: `3 × instruction index`, the
//! offset of the instruction's opcode word from the top of the code region
//! once it is loaded into machine memory.

mod builder;
pub mod codec;
mod error;
mod instruction;
mod listing;
mod op;
mod program;

pub use builder::{CodeBuilder, Label, MAX_CODE_LENGTH};
pub use error::{CapacityError, CodecError, DecodeError};
pub use instruction::{
    Instruction, RawInstruction, WORDS_PER_INSTRUCTION, instruction_index, word_address,
};
pub use listing::Listing;
pub use op::{Op, Opr, Syscall};
pub use program::Program;
