use crate::error::CapacityError;
use crate::instruction::{Instruction, word_address};
use crate::op::{Opr, Syscall};
use crate::program::Program;

/// Default maximum number of instructions a compilation may emit.
pub const MAX_CODE_LENGTH: usize = 1000;

/// A jump emitted before its destination is known.
///
/// Created by [`CodeBuilder::jump`] and [`CodeBuilder::jump_if_false`].
/// Resolve it with [`CodeBuilder::bind`].
#[derive(Debug)]
#[must_use = "an unbound label leaves a jump to word address 0"]
pub struct Label {
    /// Index of the placeholder instruction.
    index: usize,
}

/// Builds an instruction stream in generation order.
///
/// The builder is bounded: once `capacity` instructions have been emitted
/// every further emission fails with [`CapacityError`]. Code targets are
/// always word addresses, see [`word_address`].
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    code: Vec<Instruction>,
    capacity: usize,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CODE_LENGTH)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Word address of the next instruction to be emitted.
    pub fn current_address(&self) -> i32 {
        word_address(self.code.len())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn into_program(self) -> Program {
        Program::new(self.code)
    }

    /// Append one instruction and return its index.
    pub fn emit(&mut self, instruction: Instruction) -> Result<usize, CapacityError> {
        if self.code.len() >= self.capacity {
            return Err(CapacityError {
                capacity: self.capacity,
            });
        }
        let index = self.code.len();
        log::trace!("emit {index:3}: {instruction}");
        self.code.push(instruction);
        Ok(index)
    }

    /// `LIT 0 value`
    pub fn lit(&mut self, value: i32) -> Result<usize, CapacityError> {
        self.emit(Instruction::Lit { value })
    }

    /// `OPR 0 opr`
    pub fn opr(&mut self, opr: Opr) -> Result<usize, CapacityError> {
        self.emit(Instruction::Opr { opr })
    }

    /// `LOD level offset`
    pub fn lod(&mut self, level: i32, offset: i32) -> Result<usize, CapacityError> {
        self.emit(Instruction::Lod { level, offset })
    }

    /// `STO level offset`
    pub fn sto(&mut self, level: i32, offset: i32) -> Result<usize, CapacityError> {
        self.emit(Instruction::Sto { level, offset })
    }

    /// `CAL level target`
    pub fn cal(&mut self, level: i32, target: i32) -> Result<usize, CapacityError> {
        self.emit(Instruction::Cal { level, target })
    }

    /// `INC 0 count`
    pub fn inc(&mut self, count: i32) -> Result<usize, CapacityError> {
        self.emit(Instruction::Inc { count })
    }

    /// `SYS 0 call`
    pub fn sys(&mut self, call: Syscall) -> Result<usize, CapacityError> {
        self.emit(Instruction::Sys { call })
    }

    /// Emit an unconditional forward jump. Returns a [`Label`] that must be
    /// resolved later with [`bind`](Self::bind).
    pub fn jump(&mut self) -> Result<Label, CapacityError> {
        let index = self.emit(Instruction::Jmp { target: 0 })?;
        Ok(Label { index })
    }

    /// Emit a conditional forward jump (taken when the popped value is zero).
    pub fn jump_if_false(&mut self) -> Result<Label, CapacityError> {
        let index = self.emit(Instruction::Jpc { target: 0 })?;
        Ok(Label { index })
    }

    /// Bind a forward jump label to the next instruction to be emitted.
    pub fn bind(&mut self, label: Label) {
        let target = self.current_address();
        self.code[label.index].set_target(target);
    }

    /// Emit an unconditional backward jump to `target` (a word address
    /// obtained from [`current_address`](Self::current_address)).
    pub fn jump_back(&mut self, target: i32) -> Result<usize, CapacityError> {
        self.emit(Instruction::Jmp { target })
    }
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
