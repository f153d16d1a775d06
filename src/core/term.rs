//! Ground terms and rule patterns.
//!
//! ## Term
//!
//! A ground term: a constant or a functor applied to ground sub-terms. Facts,
//! moves and role names are all `Term`s. Sub-terms are shared through `Arc`
//! so cloning a term is cheap.
//!
//! ## Pattern
//!
//! A term that may contain variables. Patterns only appear inside clauses;
//! matching a pattern against a `Term` extends a set of [`Bindings`].

use std::fmt;
use std::sync::Arc;

use super::symbol::{Symbol, SymbolTable};

/// A ground term.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// An atomic constant or numeral.
    Const(Symbol),
    /// A functor applied to at least one argument.
    Func(Symbol, Arc<[Term]>),
}

impl Term {
    /// Build a compound term, collapsing to a constant when `args` is empty.
    #[must_use]
    pub fn func(functor: Symbol, args: Vec<Term>) -> Self {
        if args.is_empty() {
            Term::Const(functor)
        } else {
            Term::Func(functor, args.into())
        }
    }

    /// The head symbol (the constant itself for constants).
    #[must_use]
    pub fn functor(&self) -> Symbol {
        match self {
            Term::Const(s) | Term::Func(s, _) => *s,
        }
    }

    /// Arguments, empty for constants.
    #[must_use]
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Const(_) => &[],
            Term::Func(_, args) => args,
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args().len()
    }

    /// Render with the spellings of `symbols`.
    #[must_use]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> TermDisplay<'a> {
        TermDisplay { term: self, symbols }
    }
}

/// [`Display`](fmt::Display) adapter for a [`Term`].
pub struct TermDisplay<'a> {
    term: &'a Term,
    symbols: &'a SymbolTable,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term {
            Term::Const(s) => f.write_str(self.symbols.name(*s)),
            Term::Func(s, args) => {
                write!(f, "({}", self.symbols.name(*s))?;
                for arg in args.iter() {
                    write!(f, " {}", arg.display(self.symbols))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Index of a variable within one clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u16);

impl VarId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Variable assignment for one clause, indexed by [`VarId`].
pub type Bindings = Vec<Option<Term>>;

/// A term that may contain variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Var(VarId),
    Const(Symbol),
    Func(Symbol, Vec<Pattern>),
}

impl Pattern {
    /// Head symbol; `None` for a bare variable.
    #[must_use]
    pub fn functor(&self) -> Option<Symbol> {
        match self {
            Pattern::Var(_) => None,
            Pattern::Const(s) | Pattern::Func(s, _) => Some(*s),
        }
    }

    #[must_use]
    pub fn args(&self) -> &[Pattern] {
        match self {
            Pattern::Func(_, args) => args,
            _ => &[],
        }
    }

    /// Append every variable occurring in the pattern to `out`.
    pub fn collect_vars(&self, out: &mut Vec<VarId>) {
        match self {
            Pattern::Var(v) => out.push(*v),
            Pattern::Const(_) => {}
            Pattern::Func(_, args) => {
                for arg in args {
                    arg.collect_vars(out);
                }
            }
        }
    }

    /// Variables of the pattern, sorted and deduplicated.
    #[must_use]
    pub fn vars(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Convert a variable-free pattern into a term.
    #[must_use]
    pub fn to_term(&self) -> Option<Term> {
        self.substitute(&Vec::new())
    }

    /// Instantiate the pattern; `None` if a variable is unbound.
    #[must_use]
    pub fn substitute(&self, bindings: &Bindings) -> Option<Term> {
        match self {
            Pattern::Var(v) => bindings.get(v.index()).cloned().flatten(),
            Pattern::Const(s) => Some(Term::Const(*s)),
            Pattern::Func(s, args) => {
                let args = args
                    .iter()
                    .map(|a| a.substitute(bindings))
                    .collect::<Option<Vec<_>>>()?;
                Some(Term::func(*s, args))
            }
        }
    }

    /// Match the pattern against a ground term, extending `bindings`.
    ///
    /// Newly bound variables are pushed on `trail`. On failure the caller
    /// must unwind the trail to its previous length with [`unwind`].
    pub fn unify(&self, term: &Term, bindings: &mut Bindings, trail: &mut Vec<VarId>) -> bool {
        match self {
            Pattern::Var(v) => match &bindings[v.index()] {
                Some(bound) => bound == term,
                None => {
                    bindings[v.index()] = Some(term.clone());
                    trail.push(*v);
                    true
                }
            },
            Pattern::Const(s) => matches!(term, Term::Const(t) if t == s),
            Pattern::Func(s, args) => match term {
                Term::Func(t, targs) if t == s && targs.len() == args.len() => args
                    .iter()
                    .zip(targs.iter())
                    .all(|(p, t)| p.unify(t, bindings, trail)),
                _ => false,
            },
        }
    }

    /// Render with the spellings of `symbols` and the clause's variable names.
    #[must_use]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable, vars: &'a [Box<str>]) -> PatternDisplay<'a> {
        PatternDisplay { pattern: self, symbols, vars }
    }
}

/// Undo every binding recorded on `trail` after position `mark`.
pub fn unwind(bindings: &mut Bindings, trail: &mut Vec<VarId>, mark: usize) {
    for var in trail.drain(mark..) {
        bindings[var.index()] = None;
    }
}

/// [`Display`](fmt::Display) adapter for a [`Pattern`].
pub struct PatternDisplay<'a> {
    pattern: &'a Pattern,
    symbols: &'a SymbolTable,
    vars: &'a [Box<str>],
}

impl fmt::Display for PatternDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pattern {
            Pattern::Var(v) => match self.vars.get(v.index()) {
                Some(name) => write!(f, "?{name}"),
                None => write!(f, "?_{}", v.0),
            },
            Pattern::Const(s) => f.write_str(self.symbols.name(*s)),
            Pattern::Func(s, args) => {
                write!(f, "({}", self.symbols.name(*s))?;
                for arg in args {
                    write!(f, " {}", arg.display(self.symbols, self.vars))?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(table: &mut SymbolTable, x: &str, y: &str, mark: &str) -> Term {
        let cell = table.intern("cell");
        let args = vec![
            Term::Const(table.intern(x)),
            Term::Const(table.intern(y)),
            Term::Const(table.intern(mark)),
        ];
        Term::func(cell, args)
    }

    #[test]
    fn test_func_without_args_is_const() {
        let mut table = SymbolTable::new();
        let noop = table.intern("noop");
        assert_eq!(Term::func(noop, vec![]), Term::Const(noop));
    }

    #[test]
    fn test_display() {
        let mut table = SymbolTable::new();
        let term = cell(&mut table, "1", "2", "X");
        assert_eq!(term.display(&table).to_string(), "(cell 1 2 X)");
    }

    #[test]
    fn test_unify_binds_and_checks() {
        let mut table = SymbolTable::new();
        let term = cell(&mut table, "1", "1", "x");
        let cell_sym = table.intern("cell");
        let one = table.intern("1");

        // (cell ?a ?a ?b)
        let pattern = Pattern::Func(
            cell_sym,
            vec![Pattern::Var(VarId(0)), Pattern::Var(VarId(0)), Pattern::Var(VarId(1))],
        );
        let mut bindings: Bindings = vec![None, None];
        let mut trail = Vec::new();
        assert!(pattern.unify(&term, &mut bindings, &mut trail));
        assert_eq!(bindings[0], Some(Term::Const(one)));
        assert_eq!(trail.len(), 2);

        unwind(&mut bindings, &mut trail, 0);
        assert!(bindings.iter().all(Option::is_none));

        let other = cell(&mut table, "1", "2", "x");
        assert!(!pattern.unify(&other, &mut bindings, &mut trail));
    }

    #[test]
    fn test_substitute_requires_bound_vars() {
        let mut table = SymbolTable::new();
        let f = table.intern("f");
        let a = table.intern("a");
        let pattern = Pattern::Func(f, vec![Pattern::Var(VarId(0)), Pattern::Const(a)]);

        assert!(pattern.substitute(&vec![None]).is_none());
        let term = pattern.substitute(&vec![Some(Term::Const(a))]).unwrap();
        assert_eq!(term.display(&table).to_string(), "(f a a)");
        assert_eq!(pattern.vars(), vec![VarId(0)]);
    }
}
