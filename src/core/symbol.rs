//! Case-insensitive symbol interning.
//!
//! GDL identifiers match regardless of case: `(ROLE WHITE)` and `(role white)`
//! declare the same predicate. Every identifier is interned under its ASCII
//! lowercase key, while the first spelling seen is kept for display so that a
//! game written in uppercase still prints its roles and moves in uppercase.
//!
//! The reserved words of the language are preloaded at fixed indices and are
//! available as associated constants on [`Symbol`].

use rustc_hash::FxHashMap;

/// An interned identifier or numeral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub const ROLE: Symbol = Symbol(0);
    pub const INIT: Symbol = Symbol(1);
    pub const TRUE: Symbol = Symbol(2);
    pub const DOES: Symbol = Symbol(3);
    pub const NEXT: Symbol = Symbol(4);
    pub const LEGAL: Symbol = Symbol(5);
    pub const GOAL: Symbol = Symbol(6);
    pub const TERMINAL: Symbol = Symbol(7);
    pub const DISTINCT: Symbol = Symbol(8);
    pub const NOT: Symbol = Symbol(9);
    pub const OR: Symbol = Symbol(10);
    pub const STRAT: Symbol = Symbol(11);
    pub const ARG: Symbol = Symbol(12);
    pub const DOMAIN_P: Symbol = Symbol(13);
    pub const DOMAIN_S: Symbol = Symbol(14);

    /// Raw index into the symbol table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the predicates the engine supplies as input.
    #[must_use]
    pub fn is_input(self) -> bool {
        self == Symbol::TRUE || self == Symbol::DOES
    }
}

const RESERVED: [&str; 15] = [
    "role", "init", "true", "does", "next", "legal", "goal", "terminal", "distinct", "not", "or",
    "strat", "arg", "domain_p", "domain_s",
];

/// Interns identifiers case-insensitively.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    names: Vec<Box<str>>,
    index: FxHashMap<Box<str>, Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only the reserved words.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::with_capacity(64),
            index: FxHashMap::default(),
        };
        for word in RESERVED {
            table.intern(word);
        }
        table
    }

    /// Intern `name`, returning the existing symbol if a spelling that differs
    /// only in case was seen before.
    pub fn intern(&mut self, name: &str) -> Symbol {
        let key = name.to_ascii_lowercase();
        if let Some(&symbol) = self.index.get(key.as_str()) {
            return symbol;
        }
        let symbol = Symbol(self.names.len() as u32);
        self.names.push(name.into());
        self.index.insert(key.into_boxed_str(), symbol);
        symbol
    }

    /// Look up `name` without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.index.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// Display spelling of a symbol.
    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        &self.names[symbol.index()]
    }

    /// Interpret a symbol as an integer, if it is a numeral.
    #[must_use]
    pub fn number(&self, symbol: Symbol) -> Option<i64> {
        self.name(symbol).parse().ok()
    }

    /// Number of interned symbols, reserved words included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the reserved words are present from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words_are_preloaded() {
        let table = SymbolTable::new();
        assert_eq!(table.lookup("role"), Some(Symbol::ROLE));
        assert_eq!(table.lookup("DISTINCT"), Some(Symbol::DISTINCT));
        assert_eq!(table.lookup("Domain_S"), Some(Symbol::DOMAIN_S));
        assert_eq!(table.len(), RESERVED.len());
    }

    #[test]
    fn test_intern_is_case_insensitive() {
        let mut table = SymbolTable::new();
        let a = table.intern("WHITE");
        let b = table.intern("white");
        let c = table.intern("White");
        assert_eq!(a, b);
        assert_eq!(b, c);
        // First spelling wins for display
        assert_eq!(table.name(a), "WHITE");
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let table = SymbolTable::new();
        assert_eq!(table.lookup("cell"), None);
        assert_eq!(table.len(), RESERVED.len());
    }

    #[test]
    fn test_numbers() {
        let mut table = SymbolTable::new();
        let hundred = table.intern("100");
        let x = table.intern("x");
        assert_eq!(table.number(hundred), Some(100));
        assert_eq!(table.number(x), None);
    }

    #[test]
    fn test_inputs() {
        assert!(Symbol::TRUE.is_input());
        assert!(Symbol::DOES.is_input());
        assert!(!Symbol::LEGAL.is_input());
    }
}
