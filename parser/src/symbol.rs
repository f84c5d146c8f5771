//! Scoped symbol table.
//!
//! Declarations live in one flat list so the whole compilation can be
//! dumped afterwards. Lookup goes through a stack of frames, one per open
//! block, each owning the indices of the entries it declared. Closing a
//! frame marks its entries inactive; they stay in the list for the dump.

use std::fmt;

use thiserror::Error;

pub const MAX_SYMBOL_TABLE_SIZE: usize = 500;

/// First data offset in an activation record; the three words below it
/// hold the static link, dynamic link and return address.
pub const FIRST_VAR_OFFSET: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Const,
    Var,
    Procedure,
}

impl SymbolKind {
    pub const fn code(self) -> u8 {
        match self {
            Self::Const => 1,
            Self::Var => 2,
            Self::Procedure => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Constant value; zero for other kinds.
    pub value: i32,
    /// Lexical level of the declaring block.
    pub level: usize,
    /// Frame offset of a variable, or word address of a procedure entry.
    pub address: i32,
    pub active: bool,
}

/// Handle to a declared symbol, valid for the table that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolId(usize);

/// Returned by [`SymbolTable::open_scope`]; hand it back to close the
/// same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ScopeMark {
    depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("`{0}` is already declared in this scope")]
    Duplicate(String),
    #[error("symbol table overflow (capacity {capacity})")]
    Overflow { capacity: usize },
}

#[derive(Debug, Clone)]
struct Frame {
    entries: Vec<usize>,
    next_offset: i32,
}

impl Frame {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_offset: FIRST_VAR_OFFSET,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    frames: Vec<Frame>,
    capacity: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_SYMBOL_TABLE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            symbols: Vec::new(),
            frames: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every symbol ever declared, in declaration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// Lexical level of the innermost open scope.
    pub fn level(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    // ── Scopes ────────────────────────────────────────────────

    pub fn open_scope(&mut self) -> ScopeMark {
        let depth = self.frames.len();
        self.frames.push(Frame::new());
        log::trace!("open scope at level {depth}");
        ScopeMark { depth }
    }

    /// Close the scope opened by `mark`, and any scope nested in it.
    pub fn close_scope(&mut self, mark: ScopeMark) {
        while self.frames.len() > mark.depth {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            for &index in &frame.entries {
                self.symbols[index].active = false;
            }
            log::trace!(
                "close scope at level {}, {} symbols retired",
                self.frames.len(),
                frame.entries.len()
            );
        }
    }

    fn frame_mut(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::new());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    // ── Lookup ────────────────────────────────────────────────

    /// Find the active symbol visible under `name`, innermost scope first.
    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.entries.iter().rev())
            .map(|&index| &self.symbols[index])
            .find(|symbol| symbol.name == name)
    }

    /// Whether `name` is already declared in the innermost scope.
    pub fn declared_in_scope(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|frame| {
            frame
                .entries
                .iter()
                .any(|&index| self.symbols[index].name == name)
        })
    }

    // ── Declarations ──────────────────────────────────────────

    fn declare(
        &mut self,
        kind: SymbolKind,
        name: &str,
        value: i32,
        address: i32,
    ) -> Result<SymbolId, SymbolError> {
        if self.declared_in_scope(name) {
            return Err(SymbolError::Duplicate(name.to_string()));
        }
        if self.symbols.len() >= self.capacity {
            return Err(SymbolError::Overflow {
                capacity: self.capacity,
            });
        }
        let index = self.symbols.len();
        let level = self.level();
        self.frame_mut().entries.push(index);
        self.symbols.push(Symbol {
            kind,
            name: name.to_string(),
            value,
            level,
            address,
            active: true,
        });
        log::trace!("declare {kind:?} `{name}` at level {level}");
        Ok(SymbolId(index))
    }

    pub fn declare_const(&mut self, name: &str, value: i32) -> Result<SymbolId, SymbolError> {
        self.declare(SymbolKind::Const, name, value, 0)
    }

    /// Declare a variable at the next free offset of the current frame.
    pub fn declare_var(&mut self, name: &str) -> Result<SymbolId, SymbolError> {
        let offset = self.frame_mut().next_offset;
        let id = self.declare(SymbolKind::Var, name, 0, offset)?;
        self.frame_mut().next_offset += 1;
        Ok(id)
    }

    /// Declare a procedure whose entry address is filled in later.
    pub fn declare_procedure(&mut self, name: &str) -> Result<SymbolId, SymbolError> {
        self.declare(SymbolKind::Procedure, name, 0, 0)
    }

    pub fn set_address(&mut self, id: SymbolId, address: i32) {
        self.symbols[id.0].address = address;
    }

    /// Table rendering used by the compiler driver.
    pub fn dump(&self) -> SymbolDump<'_> {
        SymbolDump(self)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Tabular view of a [`SymbolTable`]; `Mark` is 1 for retired entries.
pub struct SymbolDump<'a>(&'a SymbolTable);

impl fmt::Display for SymbolDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kind | Name        | Value | Level | Address | Mark")?;
        writeln!(f, "-----+-------------+-------+-------+---------+-----")?;
        for symbol in self.0.symbols() {
            writeln!(
                f,
                "{:4} | {:>11} | {:5} | {:5} | {:7} | {:4}",
                symbol.kind.code(),
                symbol.name,
                symbol.value,
                symbol.level,
                symbol.address,
                u8::from(!symbol.active),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_get_consecutive_offsets() {
        let mut table = SymbolTable::new();
        let _scope = table.open_scope();
        let x = table.declare_var("x").unwrap();
        table.declare_const("k", 7).unwrap();
        let y = table.declare_var("y").unwrap();
        assert_eq!(table.get(x).address, 3);
        assert_eq!(table.get(y).address, 4);
        assert_eq!(table.find("k").map(|s| s.value), Some(7));
    }

    #[test]
    fn undeclared_name_is_not_found() {
        let mut table = SymbolTable::new();
        assert!(table.find("ghost").is_none());
        let _outer = table.open_scope();
        table.declare_var("x").unwrap();
        let _inner = table.open_scope();
        table.declare_const("y", 2).unwrap();
        assert!(table.find("ghost").is_none());
        assert!(table.find("X").is_none());
    }

    #[test]
    fn duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        let _scope = table.open_scope();
        table.declare_var("x").unwrap();
        assert_eq!(
            table.declare_const("x", 1),
            Err(SymbolError::Duplicate("x".into()))
        );
    }

    #[test]
    fn inner_scope_shadows_and_retires() {
        let mut table = SymbolTable::new();
        let _outer = table.open_scope();
        table.declare_var("x").unwrap();
        let inner = table.open_scope();
        table.declare_const("x", 9).unwrap();
        assert_eq!(table.level(), 1);
        let found = table.find("x").unwrap();
        assert_eq!((found.kind, found.level), (SymbolKind::Const, 1));

        table.close_scope(inner);
        let found = table.find("x").unwrap();
        assert_eq!((found.kind, found.level), (SymbolKind::Var, 0));
        assert_eq!(table.len(), 2);
        assert!(!table.symbols()[1].active);
        assert!(table.symbols()[0].active);
    }

    #[test]
    fn outer_declarations_after_inner_scope_remain_visible() {
        let mut table = SymbolTable::new();
        let outer = table.open_scope();
        table.declare_procedure("p").unwrap();
        let inner = table.open_scope();
        table.declare_var("a").unwrap();
        table.close_scope(inner);
        table.declare_procedure("q").unwrap();
        assert!(table.find("a").is_none());
        assert!(table.find("p").is_some());
        assert!(table.find("q").is_some());
        table.close_scope(outer);
        assert!(table.find("p").is_none());
        assert!(table.symbols().iter().all(|s| !s.active));
    }

    #[test]
    fn inner_frame_offsets_restart() {
        let mut table = SymbolTable::new();
        let _outer = table.open_scope();
        table.declare_var("a").unwrap();
        table.declare_var("b").unwrap();
        let _inner = table.open_scope();
        let c = table.declare_var("c").unwrap();
        assert_eq!(table.get(c).address, 3);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut table = SymbolTable::with_capacity(2);
        let _scope = table.open_scope();
        table.declare_var("a").unwrap();
        table.declare_var("b").unwrap();
        assert_eq!(
            table.declare_var("c"),
            Err(SymbolError::Overflow { capacity: 2 })
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn dump_lists_every_entry() {
        let mut table = SymbolTable::new();
        let scope = table.open_scope();
        table.declare_const("k", 5).unwrap();
        table.declare_var("x").unwrap();
        table.close_scope(scope);
        let text = table.dump().to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[2],
            "   1 |           k |     5 |     0 |       0 |    1"
        );
        assert_eq!(
            lines[3],
            "   2 |           x |     0 |     0 |       3 |    1"
        );
    }
}
