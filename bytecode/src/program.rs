use crate::error::CodecError;
use crate::instruction::{Instruction, RawInstruction, instruction_index};

/// A finished instruction stream, index 0 first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    code: Vec<Instruction>,
}

impl Program {
    pub fn new(code: Vec<Instruction>) -> Self {
        Self { code }
    }

    /// Decode a raw stream, rejecting any triple that is not an instruction.
    pub fn from_raw(raw: &[RawInstruction]) -> Result<Self, CodecError> {
        let code = raw
            .iter()
            .enumerate()
            .map(|(index, r)| {
                Instruction::decode(*r)
                    .map_err(|source| CodecError::Decode { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { code })
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.code.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.code.iter()
    }

    pub fn to_raw(&self) -> Vec<RawInstruction> {
        self.code.iter().map(Instruction::encode).collect()
    }

    /// Instructions whose code target is not the word address of an
    /// instruction in this program, as `(index, target)` pairs.
    pub fn dangling_targets(&self) -> Vec<(usize, i32)> {
        self.code
            .iter()
            .enumerate()
            .filter_map(|(index, instr)| {
                let target = instr.target()?;
                match instruction_index(target) {
                    Some(t) if t < self.code.len() => None,
                    _ => Some((index, target)),
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.code.iter()
    }
}
