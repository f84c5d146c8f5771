//! One-pass recursive-descent compiler.
//!
//! The parser consumes tokens and emits PM/0 code as it recognizes each
//! construct; there is no syntax tree. Forward jumps are emitted as
//! placeholders and bound once their target is known.
//!
//! Grammar:
//!
//! ```text
//! program    = block "." ;
//! block      = [const-decl] [var-decl] {proc-decl} statement ;
//! const-decl = "const" ident "=" number {"," ident "=" number} ";" ;
//! var-decl   = "var" ident {"," ident} ";" ;
//! proc-decl  = "procedure" ident ";" block ";" ;
//! statement  = [ ident ":=" expression
//!              | "call" ident
//!              | "begin" statement {";" statement} "end"
//!              | "if" condition "then" statement ["else" statement] ["fi"]
//!              | "while" condition "do" statement
//!              | "read" ident
//!              | "write" expression ] ;
//! condition  = "even" expression | expression rel-op expression ;
//! expression = ["+" | "-"] term {("+" | "-") term} ;
//! term       = factor {("*" | "/") factor} ;
//! factor     = ident | number | "(" expression ")" ;
//! ```
//!
//! The outermost block also accepts `statement {";" statement}` before the
//! final period.

use std::iter::Peekable;

use pm0_bytecode::{CodeBuilder, MAX_CODE_LENGTH, Opr, Program, Syscall};

use crate::error::{CompileError, ErrorKind};
use crate::span::Span;
use crate::symbol::{FIRST_VAR_OFFSET, MAX_SYMBOL_TABLE_SIZE, SymbolId, SymbolKind, SymbolTable};
use crate::token::{Token, TokenKind};

pub const MAX_TOKENS: usize = 10_000;

/// Capacity limits for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerSettings {
    pub max_code_length: usize,
    pub max_symbols: usize,
    pub max_tokens: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            max_code_length: MAX_CODE_LENGTH,
            max_symbols: MAX_SYMBOL_TABLE_SIZE,
            max_tokens: MAX_TOKENS,
        }
    }
}

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub program: Program,
    /// Every declared symbol; all of them are inactive once compilation
    /// has finished.
    pub symbols: SymbolTable,
}

/// Compile a token stream.
///
/// Tokens are buffered first: more than `max_tokens` is a capacity error,
/// and any lexical error token fails the compile before parsing starts.
pub fn compile<I>(tokens: I, settings: &CompilerSettings) -> Result<Compilation, CompileError>
where
    I: IntoIterator<Item = Token>,
{
    let mut buffer = Vec::new();
    for token in tokens {
        if buffer.len() >= settings.max_tokens {
            return Err(CompileError::new(ErrorKind::TokenOverflow, token.span));
        }
        buffer.push(token);
    }
    if let Some(bad) = buffer.iter().find(|t| t.is_error()) {
        return Err(CompileError::new(ErrorKind::Scanning(bad.error), bad.span));
    }
    log::debug!("parsing {} tokens", buffer.len());

    let mut parser = Parser::new(buffer.into_iter(), settings);
    parser.program()?;
    let compilation = parser.finish();
    log::debug!(
        "compiled {} instructions, {} symbols",
        compilation.program.len(),
        compilation.symbols.len()
    );
    Ok(compilation)
}

type PResult<T> = Result<T, CompileError>;

pub struct Parser<I: Iterator<Item = Token>> {
    tokens: Peekable<I>,
    /// Span of the last consumed token, for errors at end of input.
    last_span: Option<Span>,
    code: CodeBuilder,
    symbols: SymbolTable,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn new(tokens: I, settings: &CompilerSettings) -> Self {
        Self {
            tokens: tokens.peekable(),
            last_span: None,
            code: CodeBuilder::with_capacity(settings.max_code_length),
            symbols: SymbolTable::with_capacity(settings.max_symbols),
        }
    }

    pub fn finish(self) -> Compilation {
        Compilation {
            program: self.code.into_program(),
            symbols: self.symbols,
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Token helpers
    // ───────────────────────────────────────────────────────────

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.tokens.peek().map(|t| t.kind)
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.next()?;
        if token.span.is_some() {
            self.last_span = token.span;
        }
        Some(token)
    }

    fn accept(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, err: ErrorKind) -> PResult<Token> {
        if self.check(kind) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.error(err))
    }

    fn peek_lexeme(&mut self) -> String {
        self.tokens
            .peek()
            .map(|t| t.lexeme().to_string())
            .unwrap_or_default()
    }

    /// Consume an identifier and return its name.
    fn expect_ident(&mut self) -> PResult<String> {
        let token = self.expect(TokenKind::Ident, ErrorKind::ExpectedIdentifier)?;
        Ok(token.lexeme.unwrap_or_default())
    }

    /// An error located at the next token, or at the end of input.
    fn error(&mut self, kind: ErrorKind) -> CompileError {
        let span = match self.tokens.peek() {
            Some(token) => token.span.or(self.last_span),
            None => self.last_span,
        };
        CompileError::new(kind, span)
    }

    fn lookup(&mut self, name: &str) -> PResult<(SymbolKind, usize, i32, i32)> {
        let found = self
            .symbols
            .find(name)
            .map(|s| (s.kind, s.level, s.value, s.address));
        found.ok_or_else(|| self.error(ErrorKind::UndeclaredIdentifier))
    }

    /// Static-link hops from the current block to one at `level`.
    fn hops(&self, level: usize) -> i32 {
        (self.symbols.level() - level) as i32
    }

    // Propagate builder and symbol-table failures with the current location.
    fn emitted<T, E: Into<ErrorKind>>(&mut self, result: Result<T, E>) -> PResult<T> {
        result.map_err(|err| self.error(err.into()))
    }

    // ───────────────────────────────────────────────────────────
    //  Program structure
    // ───────────────────────────────────────────────────────────

    pub fn program(&mut self) -> PResult<()> {
        self.block(None)?;
        self.expect(TokenKind::Period, ErrorKind::MissingPeriod)?;
        let halt = self.code.sys(Syscall::Halt);
        self.emitted(halt)?;
        Ok(())
    }

    /// Compile a block. `owner` is the procedure whose body this is, or
    /// `None` for the main program.
    fn block(&mut self, owner: Option<SymbolId>) -> PResult<()> {
        let scope = self.symbols.open_scope();
        if let Some(owner) = owner {
            self.symbols.set_address(owner, self.code.current_address());
        }
        let skip = self.code.jump();
        let skip = self.emitted(skip)?;

        if self.check(TokenKind::Const) {
            self.const_declaration()?;
        }
        let vars = if self.check(TokenKind::Var) {
            self.var_declaration()?
        } else {
            0
        };
        while self.check(TokenKind::Procedure) {
            self.procedure_declaration()?;
        }

        self.code.bind(skip);
        let inc = self.code.inc(FIRST_VAR_OFFSET + vars);
        self.emitted(inc)?;

        self.statement()?;
        if owner.is_none() {
            while self.accept(TokenKind::Semicolon) {
                self.statement()?;
            }
        } else {
            let ret = self.code.opr(Opr::Rtn);
            self.emitted(ret)?;
        }
        self.symbols.close_scope(scope);
        Ok(())
    }

    fn const_declaration(&mut self) -> PResult<()> {
        self.advance();
        loop {
            let name = self.expect_ident()?;
            if self.symbols.declared_in_scope(&name) {
                return Err(self.error(ErrorKind::DuplicateSymbol));
            }
            self.expect(TokenKind::Eq, ErrorKind::ConstAssignEq)?;
            let number = self.expect(TokenKind::Number, ErrorKind::ConstIntegerValue)?;
            let value = parse_number(&number)?;
            let declared = self.symbols.declare_const(&name, value);
            self.emitted(declared)?;
            if !self.accept(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ErrorKind::DeclarationSemicolon)?;
        Ok(())
    }

    /// Returns the number of variables declared.
    fn var_declaration(&mut self) -> PResult<i32> {
        self.advance();
        let mut count = 0;
        loop {
            let name = self.expect_ident()?;
            let declared = self.symbols.declare_var(&name);
            self.emitted(declared)?;
            count += 1;
            if !self.accept(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ErrorKind::DeclarationSemicolon)?;
        Ok(count)
    }

    fn procedure_declaration(&mut self) -> PResult<()> {
        self.advance();
        let name = self.expect_ident()?;
        let declared = self.symbols.declare_procedure(&name);
        let id = self.emitted(declared)?;
        self.expect(TokenKind::Semicolon, ErrorKind::ProcedureSemicolon)?;
        self.block(Some(id))?;
        self.expect(TokenKind::Semicolon, ErrorKind::ProcedureSemicolon)?;
        Ok(())
    }

    // ───────────────────────────────────────────────────────────
    //  Statements
    // ───────────────────────────────────────────────────────────

    fn statement(&mut self) -> PResult<()> {
        match self.peek_kind() {
            Some(TokenKind::Ident) => self.assignment(),
            Some(TokenKind::Call) => self.call(),
            Some(TokenKind::Begin) => {
                self.advance();
                self.statement()?;
                while self.accept(TokenKind::Semicolon) {
                    self.statement()?;
                }
                self.expect(TokenKind::End, ErrorKind::BeginEnd)?;
                Ok(())
            }
            Some(TokenKind::If) => self.if_statement(),
            Some(TokenKind::While) => self.while_statement(),
            Some(TokenKind::Read) => {
                self.advance();
                if !self.check(TokenKind::Ident) {
                    return Err(self.error(ErrorKind::ExpectedIdentifier));
                }
                let name = self.peek_lexeme();
                let (kind, level, _, address) = self.lookup(&name)?;
                if kind != SymbolKind::Var {
                    return Err(self.error(ErrorKind::NotAVariable));
                }
                self.advance();
                let read = self.code.sys(Syscall::Read);
                self.emitted(read)?;
                let hops = self.hops(level);
                let store = self.code.sto(hops, address);
                self.emitted(store)?;
                Ok(())
            }
            Some(TokenKind::Write) => {
                self.advance();
                self.expression()?;
                let write = self.code.sys(Syscall::Write);
                self.emitted(write)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn assignment(&mut self) -> PResult<()> {
        let name = self.peek_lexeme();
        let (kind, level, _, address) = self.lookup(&name)?;
        if kind != SymbolKind::Var {
            return Err(self.error(ErrorKind::NotAVariable));
        }
        self.advance();
        self.expect(TokenKind::Becomes, ErrorKind::AssignBecomes)?;
        self.expression()?;
        let hops = self.hops(level);
        let store = self.code.sto(hops, address);
        self.emitted(store)?;
        Ok(())
    }

    fn call(&mut self) -> PResult<()> {
        self.advance();
        if !self.check(TokenKind::Ident) {
            return Err(self.error(ErrorKind::ExpectedIdentifier));
        }
        let name = self.peek_lexeme();
        let (kind, level, _, address) = self.lookup(&name)?;
        if kind != SymbolKind::Procedure {
            return Err(self.error(ErrorKind::CallNonProcedure));
        }
        self.advance();
        let hops = self.hops(level);
        let call = self.code.cal(hops, address);
        self.emitted(call)?;
        Ok(())
    }

    fn if_statement(&mut self) -> PResult<()> {
        self.advance();
        self.condition()?;
        let skip_then = self.code.jump_if_false();
        let skip_then = self.emitted(skip_then)?;
        self.expect(TokenKind::Then, ErrorKind::IfThen)?;
        self.statement()?;
        if self.accept(TokenKind::Else) {
            let skip_else = self.code.jump();
            let skip_else = self.emitted(skip_else)?;
            self.code.bind(skip_then);
            self.statement()?;
            self.code.bind(skip_else);
        } else {
            self.code.bind(skip_then);
        }
        self.accept(TokenKind::Fi);
        Ok(())
    }

    fn while_statement(&mut self) -> PResult<()> {
        self.advance();
        let loop_start = self.code.current_address();
        self.condition()?;
        self.expect(TokenKind::Do, ErrorKind::WhileDo)?;
        let exit = self.code.jump_if_false();
        let exit = self.emitted(exit)?;
        self.statement()?;
        let back = self.code.jump_back(loop_start);
        self.emitted(back)?;
        self.code.bind(exit);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────
    //  Conditions and expressions
    // ───────────────────────────────────────────────────────────

    fn condition(&mut self) -> PResult<()> {
        if self.accept(TokenKind::Even) {
            self.expression()?;
            let even = self.code.opr(Opr::Even);
            self.emitted(even)?;
            return Ok(());
        }
        self.expression()?;
        let opr = match self.peek_kind() {
            Some(TokenKind::Eq) => Opr::Eql,
            Some(TokenKind::Neq) => Opr::Neq,
            Some(TokenKind::Less) => Opr::Lss,
            Some(TokenKind::Leq) => Opr::Leq,
            Some(TokenKind::Gtr) => Opr::Gtr,
            Some(TokenKind::Geq) => Opr::Geq,
            _ => return Err(self.error(ErrorKind::ConditionRelation)),
        };
        self.advance();
        self.expression()?;
        let compare = self.code.opr(opr);
        self.emitted(compare)?;
        Ok(())
    }

    fn expression(&mut self) -> PResult<()> {
        if self.accept(TokenKind::Minus) {
            // Negation is 0 - term.
            let zero = self.code.lit(0);
            self.emitted(zero)?;
            self.term()?;
            let sub = self.code.opr(Opr::Sub);
            self.emitted(sub)?;
        } else {
            self.accept(TokenKind::Plus);
            self.term()?;
        }
        loop {
            let opr = match self.peek_kind() {
                Some(TokenKind::Plus) => Opr::Add,
                Some(TokenKind::Minus) => Opr::Sub,
                _ => return Ok(()),
            };
            self.advance();
            self.term()?;
            let emitted = self.code.opr(opr);
            self.emitted(emitted)?;
        }
    }

    fn term(&mut self) -> PResult<()> {
        self.factor()?;
        loop {
            let opr = match self.peek_kind() {
                Some(TokenKind::Mult) => Opr::Mul,
                Some(TokenKind::Slash) => Opr::Div,
                _ => return Ok(()),
            };
            self.advance();
            self.factor()?;
            let emitted = self.code.opr(opr);
            self.emitted(emitted)?;
        }
    }

    fn factor(&mut self) -> PResult<()> {
        match self.peek_kind() {
            Some(TokenKind::Ident) => {
                let name = self.peek_lexeme();
                let (kind, level, value, address) = self.lookup(&name)?;
                let hops = self.hops(level);
                let emitted = match kind {
                    SymbolKind::Const => self.code.lit(value),
                    SymbolKind::Var => self.code.lod(hops, address),
                    SymbolKind::Procedure => {
                        return Err(self.error(ErrorKind::ProcedureInExpression));
                    }
                };
                self.emitted(emitted)?;
                self.advance();
            }
            Some(TokenKind::Number) => {
                let token = self.tokens.peek().cloned();
                let value = match token {
                    Some(token) => parse_number(&token)?,
                    None => 0,
                };
                let lit = self.code.lit(value);
                self.emitted(lit)?;
                self.advance();
            }
            Some(TokenKind::LParen) => {
                self.advance();
                self.expression()?;
                self.expect(TokenKind::RParen, ErrorKind::RightParen)?;
            }
            _ => return Err(self.error(ErrorKind::MissingOperand)),
        }
        Ok(())
    }
}

fn parse_number(token: &Token) -> PResult<i32> {
    let text = token.lexeme();
    let invalid = || CompileError::new(ErrorKind::InvalidNumber(text.to_string()), token.span);
    text.parse::<i32>().map_err(|_| invalid())
}
