//! Per-step execution records.

use std::fmt;

/// Column header printed above the trace.
pub const TRACE_HEADER: &str = " L M PC BP SP stack";

/// A snapshot of the three registers, printed as `PC BP SP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub pc: i32,
    pub bp: i32,
    pub sp: i32,
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.pc, self.bp, self.sp)
    }
}

/// What one executed instruction left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Mnemonic, with `OPR` named after its sub-operation.
    pub name: &'static str,
    pub level: i32,
    pub modifier: i32,
    pub registers: Registers,
    /// Live stack from the initial top down to `SP`.
    pub stack: Vec<i32>,
    /// Index into `stack` where the current activation record begins,
    /// when it is not the outermost one.
    pub frame_start: Option<usize>,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Registers { pc, bp, sp } = self.registers;
        write!(
            f,
            "{:<7} {:3} {:9} {:5} {:5} {:5} ",
            self.name, self.level, self.modifier, pc, bp, sp
        )?;
        for (index, value) in self.stack.iter().enumerate() {
            if self.frame_start == Some(index) {
                write!(f, "| ")?;
            }
            write!(f, "{value:2} ")?;
        }
        Ok(())
    }
}
