//! Game description language front end.
//!
//! Text is tokenized by [`lexer`] and assembled into [`Clause`]s by
//! [`parser`]. The result is a [`Description`]: the clauses in source order
//! plus the symbol table they were interned in. Compiler directives stay
//! ordinary facts here; [`hints::extract`] removes them when the compiler
//! is configured to read them.

pub mod clause;
pub mod hints;
pub mod lexer;
pub mod parser;

pub use clause::{Clause, Literal};
pub use hints::Hint;
pub use parser::{parse, parse_ground_term};

use crate::core::SymbolTable;

/// A parsed, not yet compiled, game description.
#[derive(Clone, Debug)]
pub struct Description {
    pub symbols: SymbolTable,
    pub clauses: Vec<Clause>,
}
