//! The token-list interchange format.
//!
//! A token list is a whitespace-separated sequence of integer token codes;
//! identifier (`2`) and number (`3`) codes are followed by their lexeme.
//! Every lexical error is written as a bare `1` and loses its detail.

use std::fmt::Write as _;

use thiserror::Error;

use crate::lexer::Lexer;
use crate::token::{MAX_LEXEME_LEN, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenListError {
    #[error("token {index}: `{text}` is not a token code")]
    UnknownCode { index: usize, text: String },
    #[error("token {index}: {kind:?} is missing its lexeme")]
    MissingLexeme { index: usize, kind: TokenKind },
    #[error("token {index}: lexeme of {len} characters exceeds {MAX_LEXEME_LEN}")]
    LexemeTooLong { index: usize, len: usize },
}

/// Render tokens in the token-list format.
pub fn write_tokens<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a Token>,
{
    let mut out = String::new();
    for token in tokens {
        let _ = write!(out, "{}", token.kind.code());
        if token.kind.has_lexeme() {
            let _ = write!(out, " {}", token.lexeme());
        }
        out.push(' ');
    }
    out.push('\n');
    out
}

/// Scan source text straight into the token-list format.
pub fn scan_to_token_list(source: &str) -> String {
    let tokens: Vec<Token> = Lexer::from_str(source).collect();
    write_tokens(&tokens)
}

/// Parse a token list. Tokens read this way carry no source spans.
pub fn read_tokens(input: &str) -> Result<Vec<Token>, TokenListError> {
    let mut fields = input.split_whitespace();
    let mut tokens = Vec::new();
    while let Some(field) = fields.next() {
        let index = tokens.len();
        let kind = field
            .parse::<i64>()
            .ok()
            .and_then(TokenKind::from_code)
            .ok_or_else(|| TokenListError::UnknownCode {
                index,
                text: field.to_string(),
            })?;
        let token = if kind.has_lexeme() {
            let lexeme = fields
                .next()
                .ok_or(TokenListError::MissingLexeme { index, kind })?;
            let len = lexeme.chars().count();
            if len > MAX_LEXEME_LEN {
                return Err(TokenListError::LexemeTooLong { index, len });
            }
            Token::with_lexeme(kind, lexeme)
        } else {
            Token::new(kind)
        };
        tokens.push(token);
    }
    log::debug!("read {} tokens from token list", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_scanned_program() {
        let tokens: Vec<_> = Lexer::from_str("var x; x := 12 % .").collect();
        assert_eq!(write_tokens(&tokens), "29 2 x 17 2 x 19 3 12 1 18 \n");
    }

    #[test]
    fn scanned_list_compiles_like_the_source() {
        let source = "var x; begin read x; /* twice */ write x * 2 end.";
        let list = scan_to_token_list(source);
        assert_eq!(list, "29 2 x 17 20 32 2 x 17 31 2 x 6 3 2 21 18 \n");
        let tokens = read_tokens(&list).unwrap();
        let lexed = Lexer::from_str(source).map(|t| (t.kind, t.lexeme));
        assert!(tokens.into_iter().map(|t| (t.kind, t.lexeme)).eq(lexed));
    }

    #[test]
    fn read_restores_kinds_and_lexemes() {
        let tokens = read_tokens("29 2 x 17\n 2 x 19 3 12 18").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Becomes,
                TokenKind::Number,
                TokenKind::Period,
            ]
        );
        assert_eq!(tokens[5].lexeme(), "12");
        assert!(tokens.iter().all(|t| t.span.is_none()));
    }

    #[test]
    fn error_code_reads_as_error_token() {
        let tokens = read_tokens("1 18").unwrap();
        assert!(tokens[0].is_error());
        assert_eq!(tokens[0].error, None);
    }

    #[test]
    fn rejects_unknown_code() {
        assert_eq!(
            read_tokens("29 99"),
            Err(TokenListError::UnknownCode {
                index: 1,
                text: "99".into()
            })
        );
        assert!(matches!(
            read_tokens("x"),
            Err(TokenListError::UnknownCode { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_oversized_lexeme() {
        let long = "a".repeat(MAX_LEXEME_LEN + 1);
        assert_eq!(
            read_tokens(&format!("29 2 {long} 18")),
            Err(TokenListError::LexemeTooLong { index: 1, len: 64 })
        );
        let longest = "a".repeat(MAX_LEXEME_LEN);
        assert!(read_tokens(&format!("29 2 {longest} 18")).is_ok());
    }

    #[test]
    fn rejects_missing_lexeme() {
        assert_eq!(
            read_tokens("29 2"),
            Err(TokenListError::MissingLexeme {
                index: 1,
                kind: TokenKind::Ident
            })
        );
    }
}
