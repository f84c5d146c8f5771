//! The PM/0 machine.
//!
//! One linear array of words holds both code and stack. Code is loaded
//! from the top down, three words per instruction; the stack starts just
//! below it and grows toward address 0. Jump and call targets are word
//! offsets from the top of the code region, so address `(N-1) - m`.
//!
//! An activation record, from `BP` downward: static link, dynamic link,
//! return address, then locals at offsets 3, 4, ...
//!
//! Nothing stops the stack from growing into the code region; the memory
//! size is the only guard. Accesses outside the array trap.

use pm0_bytecode::{
    Instruction, Opr, Program, RawInstruction, Syscall, WORDS_PER_INSTRUCTION, codec,
};

use crate::console::Console;
use crate::error::VmError;
use crate::trace::{Registers, TraceRecord};

pub const DEFAULT_MEMORY_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineSettings {
    /// Total number of words, code and stack together.
    pub memory_size: usize,
}

impl MachineSettings {
    pub fn validate(&self) -> Result<(), VmError> {
        if self.memory_size == 0 || i32::try_from(self.memory_size).is_err() {
            return Err(VmError::InvalidMemorySize(self.memory_size));
        }
        Ok(())
    }
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
        }
    }
}

pub struct Machine {
    memory: Vec<i32>,
    pc: i32,
    bp: i32,
    sp: i32,
    /// First word below the code; the trace prints the stack from here.
    stack_top: i32,
    halted: bool,
}

impl Machine {
    pub fn new(settings: &MachineSettings) -> Result<Self, VmError> {
        settings.validate()?;
        let top = settings.memory_size as i32 - 1;
        Ok(Self {
            memory: vec![0; settings.memory_size],
            pc: top,
            bp: top,
            sp: top + 1,
            stack_top: top,
            halted: false,
        })
    }

    /// Convenience for `new` followed by `load_program`.
    pub fn with_program(settings: &MachineSettings, program: &Program) -> Result<Self, VmError> {
        let mut machine = Self::new(settings)?;
        machine.load_program(program)?;
        Ok(machine)
    }

    /// Clear memory, write `code` downward from the top and reset the
    /// registers. Triples are stored verbatim; they are decoded as they
    /// are fetched.
    pub fn load(&mut self, code: &[RawInstruction]) -> Result<(), VmError> {
        let size = self.memory.len();
        let step = WORDS_PER_INSTRUCTION as usize;
        if code.len().saturating_mul(step) > size {
            return Err(VmError::ProgramTooLarge {
                instructions: code.len(),
                memory_size: size,
            });
        }
        self.memory.fill(0);
        for (index, raw) in code.iter().enumerate() {
            let at = size - 1 - index * step;
            self.memory[at] = raw.op;
            self.memory[at - 1] = raw.level;
            self.memory[at - 2] = raw.modifier;
        }

        let next_free = (size - code.len() * step) as i32 - 1;
        self.pc = size as i32 - 1;
        self.sp = next_free + 1;
        self.bp = self.sp - 1;
        self.stack_top = self.sp - 1;
        self.halted = false;
        log::debug!(
            "loaded {} instructions, {} words free for the stack",
            code.len(),
            next_free + 1
        );
        Ok(())
    }

    pub fn load_program(&mut self, program: &Program) -> Result<(), VmError> {
        self.load(&program.to_raw())
    }

    /// Load the text form written by the compiler.
    pub fn load_text(&mut self, text: &str) -> Result<(), VmError> {
        let code = codec::read_text(text)?;
        self.load(&code)
    }

    pub fn registers(&self) -> Registers {
        Registers {
            pc: self.pc,
            bp: self.bp,
            sp: self.sp,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn memory(&self) -> &[i32] {
        &self.memory
    }

    // ───────────────────────────────────────────────────────────
    //  Memory access
    // ───────────────────────────────────────────────────────────

    fn cell(&self, address: i32) -> Result<usize, VmError> {
        usize::try_from(address)
            .ok()
            .filter(|&index| index < self.memory.len())
            .ok_or(VmError::AddressOutOfBounds { address })
    }

    fn read(&self, address: i32) -> Result<i32, VmError> {
        Ok(self.memory[self.cell(address)?])
    }

    fn write(&mut self, address: i32, value: i32) -> Result<(), VmError> {
        let index = self.cell(address)?;
        self.memory[index] = value;
        Ok(())
    }

    fn push(&mut self, value: i32) -> Result<(), VmError> {
        self.sp = self.sp.saturating_sub(1);
        self.write(self.sp, value)
    }

    fn pop(&mut self) -> Result<i32, VmError> {
        let value = self.read(self.sp)?;
        self.sp = self.sp.saturating_add(1);
        Ok(value)
    }

    /// Follow the static link `level` times from `BP`.
    fn base(&self, level: i32) -> Result<i32, VmError> {
        let mut base = self.bp;
        for _ in 0..level.max(0) {
            base = self.read(base)?;
        }
        Ok(base)
    }

    /// Memory address of code word offset `target`.
    fn code_address(&self, target: i32) -> i32 {
        (self.memory.len() as i32 - 1).saturating_sub(target)
    }

    // ───────────────────────────────────────────────────────────
    //  Execution
    // ───────────────────────────────────────────────────────────

    fn fetch(&self) -> Result<Instruction, VmError> {
        let at = self.pc;
        let raw = RawInstruction::new(
            self.read(at)?,
            self.read(at.saturating_sub(1))?,
            self.read(at.saturating_sub(2))?,
        );
        Instruction::decode(raw).map_err(|err| VmError::decode(err, at))
    }

    /// Execute one instruction and describe the resulting state.
    pub fn step(&mut self, console: &mut dyn Console) -> Result<TraceRecord, VmError> {
        if self.halted {
            return Err(VmError::Halted);
        }
        let at = self.pc;
        let instruction = self.fetch()?;
        self.pc = at - WORDS_PER_INSTRUCTION;
        log::trace!("{at:>5}: {instruction}");

        match instruction {
            Instruction::Lit { value } => self.push(value)?,
            Instruction::Opr { opr } => self.operate(opr, at)?,
            Instruction::Lod { level, offset } => {
                let address = self.base(level)?.saturating_sub(offset);
                let value = self.read(address)?;
                self.push(value)?;
            }
            Instruction::Sto { level, offset } => {
                let address = self.base(level)?.saturating_sub(offset);
                let value = self.pop()?;
                self.write(address, value)?;
            }
            Instruction::Cal { level, target } => {
                let static_link = self.base(level)?;
                let sp = self.sp;
                self.write(sp.saturating_sub(1), static_link)?;
                self.write(sp.saturating_sub(2), self.bp)?;
                self.write(sp.saturating_sub(3), self.pc)?;
                self.bp = sp - 1;
                self.pc = self.code_address(target);
            }
            Instruction::Inc { count } => self.sp = self.sp.saturating_sub(count),
            Instruction::Jmp { target } => self.pc = self.code_address(target),
            Instruction::Jpc { target } => {
                if self.pop()? == 0 {
                    self.pc = self.code_address(target);
                }
            }
            Instruction::Sys { call } => match call {
                Syscall::Write => {
                    let value = self.pop()?;
                    console.write_integer(value)?;
                }
                Syscall::Read => {
                    let value = console.read_integer()?;
                    self.push(value)?;
                }
                Syscall::Halt => {
                    self.halted = true;
                    log::debug!("halted");
                }
            },
        }
        Ok(self.trace(&instruction))
    }

    fn operate(&mut self, opr: Opr, at: i32) -> Result<(), VmError> {
        let result = match opr {
            Opr::Rtn => {
                self.sp = self.bp.saturating_add(1);
                self.bp = self.read(self.sp.saturating_sub(2))?;
                self.pc = self.read(self.sp.saturating_sub(3))?;
                return Ok(());
            }
            Opr::Even => {
                let value = self.read(self.sp)?;
                return self.write(self.sp, i32::from(value % 2 == 0));
            }
            Opr::Add => {
                let (lhs, rhs) = self.operands()?;
                lhs.wrapping_add(rhs)
            }
            Opr::Sub => {
                let (lhs, rhs) = self.operands()?;
                lhs.wrapping_sub(rhs)
            }
            Opr::Mul => {
                let (lhs, rhs) = self.operands()?;
                lhs.wrapping_mul(rhs)
            }
            Opr::Div => {
                let (lhs, rhs) = self.operands()?;
                if rhs == 0 {
                    return Err(VmError::DivisionByZero { address: at });
                }
                lhs.wrapping_div(rhs)
            }
            Opr::Eql => self.compare(|l, r| l == r)?,
            Opr::Neq => self.compare(|l, r| l != r)?,
            Opr::Lss => self.compare(|l, r| l < r)?,
            Opr::Leq => self.compare(|l, r| l <= r)?,
            Opr::Gtr => self.compare(|l, r| l > r)?,
            Opr::Geq => self.compare(|l, r| l >= r)?,
        };
        // The right operand is popped; the left is replaced in place.
        self.write(self.sp.saturating_add(1), result)?;
        self.sp = self.sp.saturating_add(1);
        Ok(())
    }

    /// `(left, right)`: the right operand is on top.
    fn operands(&self) -> Result<(i32, i32), VmError> {
        let rhs = self.read(self.sp)?;
        let lhs = self.read(self.sp.saturating_add(1))?;
        Ok((lhs, rhs))
    }

    fn compare(&self, test: impl Fn(i32, i32) -> bool) -> Result<i32, VmError> {
        let (lhs, rhs) = self.operands()?;
        Ok(i32::from(test(lhs, rhs)))
    }

    fn trace(&self, instruction: &Instruction) -> TraceRecord {
        let mut stack = Vec::new();
        let mut frame_start = None;
        let mut address = self.stack_top;
        while address >= self.sp.max(0) {
            if address == self.bp && address != self.sp && self.bp != self.stack_top {
                frame_start = Some(stack.len());
            }
            stack.push(self.read(address).unwrap_or_default());
            address -= 1;
        }
        TraceRecord {
            name: instruction.name(),
            level: instruction.level(),
            modifier: instruction.modifier(),
            registers: self.registers(),
            stack,
            frame_start,
        }
    }

    /// Step until halt, handing every record to `on_step`.
    pub fn run(
        &mut self,
        console: &mut dyn Console,
        mut on_step: impl FnMut(&TraceRecord),
    ) -> Result<(), VmError> {
        while !self.halted {
            let record = self.step(console)?;
            on_step(&record);
        }
        Ok(())
    }
}
