//! Clauses, literals and the compile-time rewriting applied to them.
//!
//! A parsed body may contain `or` literals. [`Clause::expand`] distributes them
//! into one clause per alternative, so later stages only ever see positive
//! atoms, negated atoms and `distinct`.

use std::fmt;

use crate::core::{Pattern, Symbol, SymbolTable, VarId};
use crate::error::{Error, Result};

/// One body literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Atom(Pattern),
    Not(Pattern),
    Distinct(Pattern, Pattern),
    /// Disjunction; each alternative is a conjunction.
    Or(Vec<Vec<Literal>>),
}

impl Literal {
    /// Predicate symbol of an atom or negated atom.
    #[must_use]
    pub fn predicate(&self) -> Option<Symbol> {
        match self {
            Literal::Atom(p) | Literal::Not(p) => p.functor(),
            _ => None,
        }
    }

    fn collect_vars(&self, out: &mut Vec<VarId>) {
        match self {
            Literal::Atom(p) | Literal::Not(p) => p.collect_vars(out),
            Literal::Distinct(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
            Literal::Or(alts) => {
                for lit in alts.iter().flatten() {
                    lit.collect_vars(out);
                }
            }
        }
    }
}

/// A fact (empty body) or a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub head: Pattern,
    pub body: Vec<Literal>,
    /// Lowercased variable names, indexed by [`VarId`].
    pub var_names: Vec<Box<str>>,
    /// Byte offset of the clause in the source text.
    pub offset: usize,
}

impl Clause {
    #[must_use]
    pub fn predicate(&self) -> Symbol {
        // Heads are never bare variables; the parser rejects them.
        self.head.functor().unwrap_or(Symbol::ROLE)
    }

    #[must_use]
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    /// Distribute every `or` literal, yielding clauses free of disjunction.
    #[must_use]
    pub fn expand(&self) -> Vec<Clause> {
        expand_conjunction(&self.body)
            .into_iter()
            .map(|body| Clause {
                head: self.head.clone(),
                body,
                var_names: self.var_names.clone(),
                offset: self.offset,
            })
            .collect()
    }

    /// Check that every variable of the head, of a negation and of a
    /// `distinct` is bound by some positive atom of the (expanded) body.
    pub fn check_safety(&self, symbols: &SymbolTable) -> Result<()> {
        let mut bound = Vec::new();
        for lit in &self.body {
            if let Literal::Atom(p) = lit {
                p.collect_vars(&mut bound);
            }
        }

        let mut needed = Vec::new();
        self.head.collect_vars(&mut needed);
        for lit in &self.body {
            if !matches!(lit, Literal::Atom(_)) {
                lit.collect_vars(&mut needed);
            }
        }

        match needed.into_iter().find(|v| !bound.contains(v)) {
            Some(var) => Err(Error::UngroundedVariable {
                variable: self.var_names[var.index()].to_string(),
                rule: self.head.display(symbols, &self.var_names).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Render the clause back to description syntax.
    #[must_use]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> ClauseDisplay<'a> {
        ClauseDisplay { clause: self, symbols }
    }
}

fn expand_conjunction(body: &[Literal]) -> Vec<Vec<Literal>> {
    let mut bodies: Vec<Vec<Literal>> = vec![Vec::with_capacity(body.len())];
    for lit in body {
        match lit {
            Literal::Or(alts) => {
                let options: Vec<Vec<Literal>> =
                    alts.iter().flat_map(|alt| expand_conjunction(alt)).collect();
                bodies = bodies
                    .into_iter()
                    .flat_map(|prefix| {
                        options.iter().map(move |opt| {
                            let mut next = prefix.clone();
                            next.extend(opt.iter().cloned());
                            next
                        })
                    })
                    .collect();
            }
            other => {
                for b in &mut bodies {
                    b.push(other.clone());
                }
            }
        }
    }
    bodies
}

/// [`Display`](fmt::Display) adapter for a [`Clause`].
pub struct ClauseDisplay<'a> {
    clause: &'a Clause,
    symbols: &'a SymbolTable,
}

impl ClauseDisplay<'_> {
    fn literal(&self, f: &mut fmt::Formatter<'_>, lit: &Literal) -> fmt::Result {
        let (symbols, vars) = (self.symbols, &self.clause.var_names[..]);
        match lit {
            Literal::Atom(p) => write!(f, "{}", p.display(symbols, vars)),
            Literal::Not(p) => write!(f, "(not {})", p.display(symbols, vars)),
            Literal::Distinct(a, b) => write!(
                f,
                "(distinct {} {})",
                a.display(symbols, vars),
                b.display(symbols, vars)
            ),
            Literal::Or(alts) => {
                f.write_str("(or")?;
                for alt in alts {
                    f.write_str(" ")?;
                    if alt.len() == 1 {
                        self.literal(f, &alt[0])?;
                    } else {
                        f.write_str("(and")?;
                        for l in alt {
                            f.write_str(" ")?;
                            self.literal(f, l)?;
                        }
                        f.write_str(")")?;
                    }
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for ClauseDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.clause.head.display(self.symbols, &self.clause.var_names);
        if self.clause.is_fact() {
            return write!(f, "{head}");
        }
        write!(f, "(<= {head}")?;
        for lit in &self.clause.body {
            f.write_str(" ")?;
            self.literal(f, lit)?;
        }
        f.write_str(")")
    }
}
