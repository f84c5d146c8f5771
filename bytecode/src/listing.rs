use core::fmt;

use crate::instruction::Instruction;

/// Assembly listing of an instruction stream: one numbered row per
/// instruction with its mnemonic, level and modifier.
pub struct Listing<'a> {
    code: &'a [Instruction],
}

impl<'a> Listing<'a> {
    pub fn new(code: &'a [Instruction]) -> Self {
        Self { code }
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Line    OP   L   M")?;
        for (line, instr) in self.code.iter().enumerate() {
            writeln!(
                f,
                "{line:3} {:>6} {:3} {:3}",
                instr.op().mnemonic(),
                instr.level(),
                instr.modifier()
            )?;
        }
        Ok(())
    }
}
