//! Flat encodings of an instruction stream.
//!
//! The text form is one instruction per line, `OP LEVEL MODIFIER` as
//! decimal integers, in generation order. The binary form is the same
//! triples as little-endian `i32`s. Both store the triples verbatim.

use std::io::{self, Write};

use crate::error::CodecError;
use crate::instruction::RawInstruction;

/// Prefix a failed compilation writes in place of the bytecode.
pub const ERROR_MARKER: &str = "Error:";

const INSTRUCTION_BYTES: usize = 12;

pub fn write_text<'a, W, I>(out: &mut W, code: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a RawInstruction>,
{
    for raw in code {
        writeln!(out, "{} {} {}", raw.op, raw.level, raw.modifier)?;
    }
    Ok(())
}

pub fn to_text(code: &[RawInstruction]) -> String {
    let mut out = Vec::new();
    // Writing into a Vec<u8> cannot fail.
    let _ = write_text(&mut out, code);
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse the text form. Blank lines are ignored.
pub fn read_text(input: &str) -> Result<Vec<RawInstruction>, CodecError> {
    let mut code = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(message) = trimmed.strip_prefix(ERROR_MARKER) {
            return Err(CodecError::CompilationFailed(message.trim().to_string()));
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [op, level, modifier] = fields.as_slice() else {
            return Err(CodecError::Malformed {
                line: line_no,
                text: trimmed.to_string(),
            });
        };
        let parse = |field: &str| {
            field.parse::<i32>().map_err(|_| CodecError::NotAnInteger {
                line: line_no,
                text: field.to_string(),
            })
        };
        code.push(RawInstruction::new(parse(*op)?, parse(*level)?, parse(*modifier)?));
    }
    log::debug!("decoded {} instructions from text", code.len());
    Ok(code)
}

pub fn encode_binary(code: &[RawInstruction]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(code.len() * INSTRUCTION_BYTES);
    for raw in code {
        buf.extend_from_slice(&raw.op.to_le_bytes());
        buf.extend_from_slice(&raw.level.to_le_bytes());
        buf.extend_from_slice(&raw.modifier.to_le_bytes());
    }
    buf
}

pub fn decode_binary(bytes: &[u8]) -> Result<Vec<RawInstruction>, CodecError> {
    if bytes.len() % INSTRUCTION_BYTES != 0 {
        return Err(CodecError::Truncated { len: bytes.len() });
    }
    let word = |chunk: &[u8], at: usize| {
        i32::from_le_bytes([chunk[at], chunk[at + 1], chunk[at + 2], chunk[at + 3]])
    };
    Ok(bytes
        .chunks_exact(INSTRUCTION_BYTES)
        .map(|chunk| RawInstruction::new(word(chunk, 0), word(chunk, 4), word(chunk, 8)))
        .collect())
}
