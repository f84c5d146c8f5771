use pm0_bytecode::CapacityError;
use thiserror::Error;

use crate::span::Span;
use crate::symbol::SymbolError;
use crate::token::LexError;

/// Broad class of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lexical,
    Syntax,
    Semantic,
    Capacity,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Scanning error detected by lexer ({})", describe_lex(.0))]
    Scanning(Option<LexError>),

    // Syntax
    #[error("program must end with period")]
    MissingPeriod,
    #[error("const, var, procedure, call, and read keywords must be followed by identifier")]
    ExpectedIdentifier,
    #[error("constants must be assigned with =")]
    ConstAssignEq,
    #[error("constants must be assigned an integer value")]
    ConstIntegerValue,
    #[error("constant and variable declarations must be followed by a semicolon")]
    DeclarationSemicolon,
    #[error("procedure declarations must be followed by a semicolon")]
    ProcedureSemicolon,
    #[error("assignment statements must use :=")]
    AssignBecomes,
    #[error("begin must be followed by end")]
    BeginEnd,
    #[error("if must be followed by then")]
    IfThen,
    #[error("while must be followed by do")]
    WhileDo,
    #[error("condition must contain comparison operator")]
    ConditionRelation,
    #[error("right parenthesis must follow left parenthesis")]
    RightParen,
    #[error("arithmetic equations must contain operands, parentheses, numbers, or symbols")]
    MissingOperand,

    // Semantic
    #[error("symbol name has already been declared")]
    DuplicateSymbol,
    #[error("undeclared identifier")]
    UndeclaredIdentifier,
    #[error("only variable values may be altered")]
    NotAVariable,
    #[error("call must be followed by a procedure identifier")]
    CallNonProcedure,
    #[error("expressions may not contain procedure identifiers")]
    ProcedureInExpression,
    #[error("number `{0}` does not fit in a machine word")]
    InvalidNumber(String),

    // Capacity
    #[error("code array overflow")]
    CodeOverflow,
    #[error("symbol table overflow")]
    SymbolOverflow,
    #[error("token buffer overflow")]
    TokenOverflow,
}

fn describe_lex(err: &Option<LexError>) -> String {
    match err {
        Some(err) => err.to_string(),
        None => "skipsym present".to_string(),
    }
}

impl ErrorKind {
    pub fn category(&self) -> Category {
        match self {
            Self::Scanning(_) => Category::Lexical,
            Self::DuplicateSymbol
            | Self::UndeclaredIdentifier
            | Self::NotAVariable
            | Self::CallNonProcedure
            | Self::ProcedureInExpression
            | Self::InvalidNumber(_) => Category::Semantic,
            Self::CodeOverflow | Self::SymbolOverflow | Self::TokenOverflow => {
                Category::Capacity
            }
            _ => Category::Syntax,
        }
    }
}

impl From<CapacityError> for ErrorKind {
    fn from(_: CapacityError) -> Self {
        Self::CodeOverflow
    }
}

impl From<SymbolError> for ErrorKind {
    fn from(err: SymbolError) -> Self {
        match err {
            SymbolError::Duplicate(_) => Self::DuplicateSymbol,
            SymbolError::Overflow { .. } => Self::SymbolOverflow,
        }
    }
}

/// A compile failure. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", at(.span))]
pub struct CompileError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
}

fn at(span: &Option<Span>) -> String {
    span.map(|span| format!(" at {span}")).unwrap_or_default()
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Option<Span>) -> Self {
        Self { kind, span }
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }
}

impl From<ErrorKind> for CompileError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, None)
    }
}
