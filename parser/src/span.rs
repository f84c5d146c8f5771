//! Where scanned tokens came from.
//!
//! Tokens read from a token list carry no position, so every consumer
//! takes `Option<Span>` and falls back to the bare message.

use std::fmt;

/// A byte position in source text. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub const fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The source range of one token, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// The text this span covers in `source`.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start.offset..self.end.offset)
    }

    /// The source line the span starts on, followed by a line with a
    /// caret under the span.
    ///
    /// ```text
    ///   y := 1
    ///   ^
    /// ```
    pub fn excerpt(&self, source: &str) -> Option<String> {
        let line = source.lines().nth(self.start.line.checked_sub(1)?)?;
        let indent = self.start.column.saturating_sub(1).min(line.len());
        let width = if self.end.line == self.start.line {
            self.end.column.saturating_sub(self.start.column).max(1)
        } else {
            1
        };
        Some(format!("{line}\n{}{}", " ".repeat(indent), "^".repeat(width)))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}
