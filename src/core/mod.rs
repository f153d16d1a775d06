//! Core value types: symbols, terms, roles, RNG.
//!
//! Everything here is independent of any particular game description.

pub mod symbol;
pub mod term;
pub mod role;
pub mod rng;

pub use symbol::{Symbol, SymbolTable};
pub use term::{Bindings, Pattern, Term, TermDisplay, VarId};
pub use role::{RoleId, RoleMap};
pub use rng::{GameRng, GameRngState};
