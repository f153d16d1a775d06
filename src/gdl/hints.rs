//! Optional compiler directives embedded in a description.
//!
//! ```text
//! (strat legal 2)          ; stratum of a predicate
//! (arg cell 3 mark)        ; argument 3 of cell ranges over domain `mark`
//! (domain_s mark x o b)    ; domain given as constants
//! (domain_p mark (f 1))    ; one more member, any ground term
//! ```
//!
//! Hints are never trusted: the compiler checks each one against what it
//! computes itself and drops it with a warning when they disagree. A fact
//! that does not decode as a directive is left in the description as an
//! ordinary fact.

use log::debug;

use crate::core::{Symbol, SymbolTable, Term};

use super::clause::Clause;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hint {
    Strat { predicate: Symbol, level: i64 },
    /// `position` is 0-based.
    Arg { predicate: Symbol, position: usize, domain: Symbol },
    DomainS { domain: Symbol, members: Vec<Term> },
    DomainP { domain: Symbol, member: Term },
}

fn is_directive(symbol: Symbol) -> bool {
    matches!(
        symbol,
        Symbol::STRAT | Symbol::ARG | Symbol::DOMAIN_S | Symbol::DOMAIN_P
    )
}

/// Remove the facts of `clauses` that decode as directives and return them.
pub fn extract(clauses: &mut Vec<Clause>, symbols: &SymbolTable) -> Vec<Hint> {
    let mut hints = Vec::new();
    clauses.retain(|clause| {
        if !clause.is_fact() || !is_directive(clause.predicate()) {
            return true;
        }
        match clause.head.to_term().and_then(|t| decode(&t, symbols)) {
            Some(hint) => {
                hints.push(hint);
                false
            }
            None => {
                debug!("{} is not a directive, keeping it", clause.display(symbols));
                true
            }
        }
    });
    hints
}

fn constant(term: &Term) -> Option<Symbol> {
    match term {
        Term::Const(s) => Some(*s),
        Term::Func(..) => None,
    }
}

fn decode(term: &Term, symbols: &SymbolTable) -> Option<Hint> {
    let args = term.args();
    match (term.functor(), args) {
        (Symbol::STRAT, [p, n]) => Some(Hint::Strat {
            predicate: constant(p)?,
            level: symbols.number(constant(n)?)?,
        }),
        (Symbol::ARG, [p, i, d]) => {
            let position = symbols.number(constant(i)?)?;
            if position < 1 {
                return None;
            }
            Some(Hint::Arg {
                predicate: constant(p)?,
                position: position as usize - 1,
                domain: constant(d)?,
            })
        }
        (Symbol::DOMAIN_S, [d, rest @ ..]) if !rest.is_empty() => Some(Hint::DomainS {
            domain: constant(d)?,
            members: rest.to_vec(),
        }),
        (Symbol::DOMAIN_P, [d, member]) => Some(Hint::DomainP {
            domain: constant(d)?,
            member: member.clone(),
        }),
        _ => None,
    }
}
