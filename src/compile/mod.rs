//! Compilation pipeline from a parsed [`Description`] to a [`Program`].
//!
//! ```text
//! Description ─ hints ─ or-expansion ─ safety ─ stratify ─ ground ─ RuleDatabase
//! ```
//!
//! Directive facts are only taken out of the description when
//! [`CompileConfig::use_hints`] is set; otherwise they are ordinary facts.
//!
//! Every step can fail; the first error aborts compilation.

pub mod config;
pub mod ground;
pub mod stratify;

pub use config::CompileConfig;
pub use ground::Relation;
pub use stratify::{Component, Stratification};

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::{Symbol, SymbolTable};
use crate::engine::RuleDatabase;
use crate::error::Result;
use crate::gdl::{hints, Clause, Description, Hint};

/// A compiled description, ready to be wrapped in a `Game`.
#[derive(Debug)]
pub struct Program {
    pub symbols: SymbolTable,
    pub db: RuleDatabase,
    /// Exact relations of the static predicates.
    pub statics: FxHashMap<Symbol, Relation>,
    /// Reachable atoms of dynamic predicates and of `true`/`does`.
    pub reachable: FxHashMap<Symbol, Relation>,
    pub dynamic: FxHashSet<Symbol>,
}

/// Compile a parsed description.
pub fn compile(description: Description, config: &CompileConfig) -> Result<Program> {
    let Description {
        symbols,
        mut clauses,
    } = description;

    let hints: Vec<Hint> = if config.use_hints {
        hints::extract(&mut clauses, &symbols)
    } else {
        Vec::new()
    };
    let clauses: Vec<Clause> = clauses.iter().flat_map(Clause::expand).collect();
    for clause in &clauses {
        clause.check_safety(&symbols)?;
    }
    debug!(
        "compiling {} clauses over {} symbols",
        clauses.len(),
        symbols.len()
    );

    let strat = Stratification::compute(&clauses, &symbols)?;
    let strat_hints: Vec<(Symbol, i64)> = hints
        .iter()
        .filter_map(|h| match h {
            Hint::Strat { predicate, level } => Some((*predicate, *level)),
            _ => None,
        })
        .collect();
    strat.check_hints(&strat_hints, &symbols);

    let grounding = ground::ground(&clauses, &strat, &hints, &symbols, config)?;
    let db = RuleDatabase::build(grounding.atoms, grounding.rules, strat);
    Ok(Program {
        symbols,
        db,
        statics: grounding.statics,
        reachable: grounding.reachable,
        dynamic: grounding.dynamic,
    })
}
