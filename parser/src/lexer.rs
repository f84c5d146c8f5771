/// Streaming scanner for PL/0 source.
///
/// The [`Lexer`] consumes bytes from any [`std::io::Read`] source and
/// implements [`Iterator`] over [`Token`]s, tracking byte offset, line and
/// column for each one. End of input simply ends the iteration.
///
/// Malformed input never stops the scan. It becomes a [`TokenKind::Skip`]
/// token carrying a [`LexError`], and scanning resumes after it:
///
/// | Input                              | Error                           |
/// |------------------------------------|---------------------------------|
/// | identifier longer than 11 chars    | [`LexError::IdentTooLong`]      |
/// | number longer than 5 digits        | [`LexError::NumberTooLong`]     |
/// | `/*` with no closing `*/`          | [`LexError::UnclosedComment`]   |
/// | lone `:` or any other stray byte   | [`LexError::InvalidSymbol`]     |
///
/// Reserved words are recognized before the length check, so a long
/// keyword-like run is only an error when it is not a keyword.
use std::io::{self, Bytes, Read};

use crate::span::{Pos, Span};
use crate::token::{LexError, MAX_IDENT_LEN, MAX_NUMBER_LEN, Token, TokenKind};

// ═══════════════════════════════════════════════════════════════════
// Source window
// ═══════════════════════════════════════════════════════════════════

/// The current byte and the one after it, pulled lazily from the reader.
///
/// Two bytes cover every lookahead the grammar needs (`:=`, `<=`, `/*`).
struct Window<R: Read> {
    bytes: Bytes<R>,
    current: Option<u8>,
    next: Option<u8>,
    pos: Pos,
}

impl<R: Read> Window<R> {
    fn new(reader: R) -> Self {
        let mut bytes = reader.bytes();
        let current = pull(&mut bytes);
        let next = current.and_then(|_| pull(&mut bytes));
        Self {
            bytes,
            current,
            next,
            pos: Pos::new(0, 1, 1),
        }
    }

    /// Step past the current byte, keeping the position in step with it.
    fn shift(&mut self) -> Option<u8> {
        let b = self.current?;
        self.current = self.next;
        self.next = self.current.and_then(|_| pull(&mut self.bytes));
        self.pos.offset += 1;
        if b == b'\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(b)
    }
}

/// Next byte of input; a read failure ends the input.
fn pull<R: Read>(bytes: &mut Bytes<R>) -> Option<u8> {
    loop {
        match bytes.next()? {
            Ok(b) => return Some(b),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                log::warn!("source read failed, treating as end of input: {err}");
                return None;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Lexer
// ═══════════════════════════════════════════════════════════════════

/// A streaming scanner for PL/0 source code.
///
/// ```rust,ignore
/// use pl0_parser::{Lexer, TokenKind};
///
/// let kinds: Vec<_> = Lexer::from_str("x := 1.").map(|t| t.kind).collect();
/// assert_eq!(kinds[1], TokenKind::Becomes);
/// ```
pub struct Lexer<R: Read> {
    src: Window<R>,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            src: Window::new(reader),
        }
    }
}

impl<'a> Lexer<&'a [u8]> {
    pub fn from_str(source: &'a str) -> Self {
        Self::new(source.as_bytes())
    }
}

impl<R: Read> Lexer<R> {
    fn pos(&self) -> Pos {
        self.src.pos
    }

    fn peek(&self) -> Option<u8> {
        self.src.current
    }

    fn advance(&mut self) -> Option<u8> {
        self.src.shift()
    }

    // ───────────────────────────────────────────────────────────
    //  Whitespace and comments
    // ───────────────────────────────────────────────────────────

    /// Skip whitespace and `/* */` comments. Returns an error token if a
    /// comment runs off the end of the input.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() || b == 0x0B => {
                    self.advance();
                }
                Some(b'/') if self.src.next == Some(b'*') => {
                    let start = self.pos();
                    self.advance();
                    self.advance();
                    let mut prev = 0u8;
                    let mut closed = false;
                    while let Some(b) = self.advance() {
                        if prev == b'*' && b == b'/' {
                            closed = true;
                            break;
                        }
                        prev = b;
                    }
                    if !closed {
                        let span = Span::new(start, self.pos());
                        return Some(Token::error(LexError::UnclosedComment, "/*").at(span));
                    }
                }
                _ => return None,
            }
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Words and numbers
    // ───────────────────────────────────────────────────────────

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let mut text = String::new();
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.advance();
            text.push(b as char);
        }
        text
    }

    fn lex_word(&mut self, start: Pos) -> Token {
        let word = self.take_while(|b| b.is_ascii_alphanumeric());
        let span = Span::new(start, self.pos());
        if let Some(kind) = TokenKind::keyword(&word) {
            return Token::new(kind).at(span);
        }
        if word.len() > MAX_IDENT_LEN {
            return Token::error(LexError::IdentTooLong, word).at(span);
        }
        Token::with_lexeme(TokenKind::Ident, word).at(span)
    }

    fn lex_number(&mut self, start: Pos) -> Token {
        let digits = self.take_while(|b| b.is_ascii_digit());
        let span = Span::new(start, self.pos());
        if digits.len() > MAX_NUMBER_LEN {
            return Token::error(LexError::NumberTooLong, digits).at(span);
        }
        Token::with_lexeme(TokenKind::Number, digits).at(span)
    }

    // ───────────────────────────────────────────────────────────
    //  Symbols
    // ───────────────────────────────────────────────────────────

    /// Consume the current byte, and the next one when it equals `second`.
    fn lex_pair(&mut self, second: u8, single: TokenKind, pair: TokenKind) -> TokenKind {
        self.advance();
        if self.peek() == Some(second) {
            self.advance();
            pair
        } else {
            single
        }
    }

    fn lex_symbol(&mut self, start: Pos, b: u8) -> Token {
        let kind = match b {
            b'+' => Some(TokenKind::Plus),
            b'-' => Some(TokenKind::Minus),
            b'*' => Some(TokenKind::Mult),
            b'/' => Some(TokenKind::Slash),
            b'=' => Some(TokenKind::Eq),
            b',' => Some(TokenKind::Comma),
            b';' => Some(TokenKind::Semicolon),
            b'.' => Some(TokenKind::Period),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            _ => None,
        };
        if let Some(kind) = kind {
            self.advance();
            return Token::new(kind).at(Span::new(start, self.pos()));
        }

        let kind = match b {
            b'<' => {
                self.advance();
                match self.peek() {
                    Some(b'=') => {
                        self.advance();
                        TokenKind::Leq
                    }
                    Some(b'>') => {
                        self.advance();
                        TokenKind::Neq
                    }
                    _ => TokenKind::Less,
                }
            }
            b'>' => self.lex_pair(b'=', TokenKind::Gtr, TokenKind::Geq),
            b':' => self.lex_pair(b'=', TokenKind::Skip, TokenKind::Becomes),
            _ => {
                self.advance();
                // Swallow the rest of a multi-byte character so it yields
                // a single error token.
                if !b.is_ascii() {
                    while matches!(self.peek(), Some(0x80..=0xBF)) {
                        self.advance();
                    }
                }
                TokenKind::Skip
            }
        };
        let span = Span::new(start, self.pos());
        if kind == TokenKind::Skip {
            let text = String::from_utf8_lossy(&[b]).into_owned();
            return Token::error(LexError::InvalidSymbol, text).at(span);
        }
        Token::new(kind).at(span)
    }

    /// Scan the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        if let Some(err) = self.skip_trivia() {
            return Some(err);
        }
        let start = self.pos();
        let b = self.peek()?;
        let token = if b.is_ascii_alphabetic() {
            self.lex_word(start)
        } else if b.is_ascii_digit() {
            self.lex_number(start)
        } else {
            self.lex_symbol(start, b)
        };
        if let Some(err) = token.error {
            log::debug!("lexical error at {start}: {err} ({:?})", token.lexeme());
        }
        Some(token)
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    fn tokens(src: &str) -> Vec<Token> {
        Lexer::from_str(src).collect()
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokens(src).into_iter().map(|t| t.kind).collect()
    }

    // ── Words ─────────────────────────────────────────────────

    #[test]
    fn lex_identifier_and_number() {
        let toks = tokens("x 42");
        let ident = Token::with_lexeme(TokenKind::Ident, "x");
        assert_eq!(toks[0], ident.at(toks[0].span.unwrap()));
        assert_eq!(toks[1].kind, TokenKind::Number);
        assert_eq!(toks[1].lexeme(), "42");
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn lex_reserved_words() {
        assert_eq!(
            kinds("const var procedure call begin end if then else fi while do read write even"),
            vec![
                TokenKind::Const,
                TokenKind::Var,
                TokenKind::Procedure,
                TokenKind::Call,
                TokenKind::Begin,
                TokenKind::End,
                TokenKind::If,
                TokenKind::Then,
                TokenKind::Else,
                TokenKind::Fi,
                TokenKind::While,
                TokenKind::Do,
                TokenKind::Read,
                TokenKind::Write,
                TokenKind::Even,
            ]
        );
    }

    #[test]
    fn reserved_words_have_no_lexeme() {
        assert!(tokens("begin").iter().all(|t| t.lexeme.is_none()));
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(kinds("BEGIN"), vec![TokenKind::Ident]);
    }

    #[test]
    fn identifier_may_contain_digits() {
        let toks = tokens("a1b2");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].lexeme(), "a1b2");
    }

    #[test]
    fn digits_then_letters_split() {
        assert_eq!(kinds("12abc"), vec![TokenKind::Number, TokenKind::Ident]);
    }

    #[test]
    fn identifier_length_limit() {
        assert_eq!(kinds("abcdefghijk"), vec![TokenKind::Ident]);
        let toks = tokens("abcdefghijkl");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].error, Some(LexError::IdentTooLong));
        assert_eq!(toks[0].lexeme(), "abcdefghijkl");
    }

    #[test]
    fn number_length_limit() {
        assert_eq!(kinds("99999"), vec![TokenKind::Number]);
        let toks = tokens("123456");
        assert_eq!(toks[0].error, Some(LexError::NumberTooLong));
    }

    // ── Symbols ───────────────────────────────────────────────

    #[test_case(":=", TokenKind::Becomes)]
    #[test_case("<=", TokenKind::Leq)]
    #[test_case("<>", TokenKind::Neq)]
    #[test_case(">=", TokenKind::Geq)]
    #[test_case("<", TokenKind::Less)]
    #[test_case(">", TokenKind::Gtr)]
    #[test_case("=", TokenKind::Eq)]
    #[test_case("/", TokenKind::Slash)]
    fn lex_operator(src: &str, expected: TokenKind) {
        assert_eq!(kinds(src), vec![expected]);
    }

    #[test]
    fn lex_punctuation() {
        assert_eq!(
            kinds("+-*(),;."),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Mult,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Period,
            ]
        );
    }

    #[test]
    fn lone_colon_is_invalid() {
        let toks = tokens(": =");
        assert_eq!(toks[0].error, Some(LexError::InvalidSymbol));
        assert_eq!(toks[0].lexeme(), ":");
        assert_eq!(toks[1].kind, TokenKind::Eq);
    }

    #[test]
    fn invalid_symbol_continues_scanning() {
        let toks = tokens("x % y");
        assert_eq!(toks.len(), 3);
        assert!(toks[1].is_error());
        assert_eq!(toks[1].error, Some(LexError::InvalidSymbol));
        assert_eq!(toks[2].lexeme(), "y");
    }

    #[test]
    fn multibyte_character_is_one_error() {
        let toks = tokens("x é y");
        assert_eq!(toks.len(), 3);
        assert!(toks[1].is_error());
    }

    // ── Comments ──────────────────────────────────────────────

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("x /* a comment * with stars **/ y"),
            vec![TokenKind::Ident, TokenKind::Ident]
        );
    }

    #[test]
    fn unclosed_comment() {
        let toks = tokens("x /* never closed");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].error, Some(LexError::UnclosedComment));
    }

    // ── Positions ─────────────────────────────────────────────

    #[test]
    fn spans_track_lines() {
        let toks = tokens("var x;\n  x := 1");
        let x = &toks[3];
        assert_eq!(x.span.unwrap().start, Pos::new(9, 2, 3));
        let becomes = &toks[4];
        assert_eq!(becomes.span.unwrap().end.column, 7);
    }

    #[test]
    fn lex_from_reader() {
        let stream = Cursor::new(b"begin write 1 end.".to_vec());
        let kinds: Vec<_> = Lexer::new(stream).map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Begin,
                TokenKind::Write,
                TokenKind::Number,
                TokenKind::End,
                TokenKind::Period,
            ]
        );
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokens("  \n\t").is_empty());
    }
}
