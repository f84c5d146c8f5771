//! Program input and output for `SYS` read and write.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::VmError;

pub const READ_PROMPT: &str = "Please Enter an Integer : ";
pub const OUTPUT_PREFIX: &str = "Output result is : ";

/// Where `SYS 0 2` reads from and `SYS 0 1` writes to.
pub trait Console {
    fn read_integer(&mut self) -> Result<i32, VmError>;
    fn write_integer(&mut self, value: i32) -> Result<(), VmError>;
}

/// A line-oriented text console: prompts before each read and accepts
/// whitespace-separated integers, several per line if given.
pub struct TextConsole<R, W> {
    input: R,
    output: W,
    pending: VecDeque<String>,
}

impl<R: BufRead, W: Write> TextConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn next_word(&mut self) -> Result<Option<String>, VmError> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }
}

impl TextConsole<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console for TextConsole<R, W> {
    fn read_integer(&mut self) -> Result<i32, VmError> {
        write!(self.output, "{READ_PROMPT}")?;
        self.output.flush()?;
        match self.next_word()? {
            Some(word) => word
                .parse()
                .map_err(|_| VmError::InvalidInput(format!("`{word}` is not an integer"))),
            None => Err(VmError::InvalidInput("end of input".to_string())),
        }
    }

    fn write_integer(&mut self, value: i32) -> Result<(), VmError> {
        writeln!(self.output, "{OUTPUT_PREFIX}{value}")?;
        Ok(())
    }
}

/// In-memory console with queued input that records every write.
#[derive(Debug, Clone, Default)]
pub struct BufferedConsole {
    input: VecDeque<i32>,
    output: Vec<i32>,
}

impl BufferedConsole {
    pub fn new(input: impl IntoIterator<Item = i32>) -> Self {
        Self {
            input: input.into_iter().collect(),
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[i32] {
        &self.output
    }
}

impl Console for BufferedConsole {
    fn read_integer(&mut self) -> Result<i32, VmError> {
        self.input
            .pop_front()
            .ok_or_else(|| VmError::InvalidInput("end of input".to_string()))
    }

    fn write_integer(&mut self, value: i32) -> Result<(), VmError> {
        self.output.push(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_console(input: &str) -> TextConsole<&[u8], Vec<u8>> {
        TextConsole::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn prompts_and_parses() {
        let mut console = text_console("  42\n");
        assert_eq!(console.read_integer().unwrap(), 42);
        console.write_integer(-7).unwrap();
        let out = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(out, "Please Enter an Integer : Output result is : -7\n");
    }

    #[test]
    fn several_integers_on_one_line() {
        let mut console = text_console("1 2\n\n3");
        let values: Vec<_> = (0..3).map(|_| console.read_integer().unwrap()).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_non_integer() {
        let mut console = text_console("abc\n");
        assert!(matches!(console.read_integer(), Err(VmError::InvalidInput(_))));
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut console = text_console("");
        assert!(matches!(console.read_integer(), Err(VmError::InvalidInput(_))));
        let mut console = BufferedConsole::default();
        assert!(matches!(console.read_integer(), Err(VmError::InvalidInput(_))));
    }
}
