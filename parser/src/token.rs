/// Token types produced by the PL/0 scanner.
use thiserror::Error;

use crate::span::Span;

/// Maximum identifier length accepted by the scanner.
pub const MAX_IDENT_LEN: usize = 11;
/// Maximum number of digits in a numeric literal.
pub const MAX_NUMBER_LEN: usize = 5;
/// Longest lexeme a token may carry.
pub const MAX_LEXEME_LEN: usize = 63;

/// The kind of a lexical token.
///
/// Discriminants are the integer codes used in the token-list format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    /// A lexical error. Also printed for every malformed token.
    Skip = 1,
    Ident = 2,
    Number = 3,
    Plus = 4,
    Minus = 5,
    Mult = 6,
    Slash = 7,
    /// `=`
    Eq = 8,
    /// `<>`
    Neq = 9,
    Less = 10,
    Leq = 11,
    Gtr = 12,
    Geq = 13,
    LParen = 14,
    RParen = 15,
    Comma = 16,
    Semicolon = 17,
    Period = 18,
    /// `:=`
    Becomes = 19,
    Begin = 20,
    End = 21,
    If = 22,
    Fi = 23,
    Then = 24,
    While = 25,
    Do = 26,
    Call = 27,
    Const = 28,
    Var = 29,
    Procedure = 30,
    Write = 31,
    Read = 32,
    Else = 33,
    Even = 34,
}

impl TokenKind {
    const ALL: [TokenKind; 34] = [
        Self::Skip,
        Self::Ident,
        Self::Number,
        Self::Plus,
        Self::Minus,
        Self::Mult,
        Self::Slash,
        Self::Eq,
        Self::Neq,
        Self::Less,
        Self::Leq,
        Self::Gtr,
        Self::Geq,
        Self::LParen,
        Self::RParen,
        Self::Comma,
        Self::Semicolon,
        Self::Period,
        Self::Becomes,
        Self::Begin,
        Self::End,
        Self::If,
        Self::Fi,
        Self::Then,
        Self::While,
        Self::Do,
        Self::Call,
        Self::Const,
        Self::Var,
        Self::Procedure,
        Self::Write,
        Self::Read,
        Self::Else,
        Self::Even,
    ];

    /// Integer code of this kind in the token-list format.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| i64::from(kind.code()) == code)
    }

    /// Look up a reserved word.
    pub fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "begin" => Self::Begin,
            "end" => Self::End,
            "if" => Self::If,
            "fi" => Self::Fi,
            "then" => Self::Then,
            "while" => Self::While,
            "do" => Self::Do,
            "call" => Self::Call,
            "const" => Self::Const,
            "var" => Self::Var,
            "procedure" => Self::Procedure,
            "write" => Self::Write,
            "read" => Self::Read,
            "else" => Self::Else,
            "even" => Self::Even,
            _ => return None,
        })
    }

    /// Whether tokens of this kind carry a lexeme in the token list.
    #[inline]
    pub const fn has_lexeme(self) -> bool {
        matches!(self, Self::Ident | Self::Number)
    }
}

/// Why the scanner rejected a piece of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("identifier too long")]
    IdentTooLong,
    #[error("number too long")]
    NumberTooLong,
    #[error("invalid symbol")]
    InvalidSymbol,
    #[error("unclosed comment")]
    UnclosedComment,
}

/// A scanned token.
///
/// `lexeme` is present for identifiers and numbers, and for error tokens
/// (the offending text). Tokens read back from a token list have no span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Option<String>,
    pub error: Option<LexError>,
    pub span: Option<Span>,
}

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            lexeme: None,
            error: None,
            span: None,
        }
    }

    pub fn with_lexeme(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Self {
            lexeme: Some(lexeme.into()),
            ..Self::new(kind)
        }
    }

    pub fn error(error: LexError, text: impl Into<String>) -> Self {
        Self {
            error: Some(error),
            ..Self::with_lexeme(TokenKind::Skip, text)
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == TokenKind::Skip
    }

    pub fn lexeme(&self) -> &str {
        self.lexeme.as_deref().unwrap_or("")
    }
}
