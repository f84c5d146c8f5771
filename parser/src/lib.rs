//! # PL/0 front end
//!
//! Scanner and one-pass compiler for PL/0, producing PM/0 bytecode.
//!
//! ## Architecture
//!
//! ```text
//!  impl Read (file, &[u8], …)        token list (text)
//!      │                                   │
//!      ▼                                   ▼
//!  ┌────────┐   Token stream   ┌──────────────────┐
//!  │ Lexer  │ ───────────────▶ │ compile (Parser) │ ──▶ Program + SymbolTable
//!  └────────┘ (impl Iterator)  └──────────────────┘
//! ```
//!
//! ```rust
//! use pl0_parser::{CompilerSettings, compile_source};
//!
//! let source = "const m = 5; var x; begin x := m + 1; write x end.";
//! let compiled = compile_source(source, &CompilerSettings::default()).unwrap();
//! assert_eq!(compiled.program.len(), 9);
//! ```
//!
//! Compilation stops at the first error; no partial program is returned.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod symbol;
pub mod token;
pub mod token_list;

pub use error::{Category, CompileError, ErrorKind};
pub use lexer::Lexer;
pub use parser::{Compilation, CompilerSettings, MAX_TOKENS, Parser, compile};
pub use span::{Pos, Span};
pub use symbol::{ScopeMark, Symbol, SymbolDump, SymbolError, SymbolId, SymbolKind, SymbolTable};
pub use token::{LexError, Token, TokenKind};
pub use token_list::{TokenListError, read_tokens, scan_to_token_list, write_tokens};

/// Scan and compile PL/0 source text.
pub fn compile_source(
    source: &str,
    settings: &CompilerSettings,
) -> Result<Compilation, CompileError> {
    compile(Lexer::from_str(source), settings)
}
