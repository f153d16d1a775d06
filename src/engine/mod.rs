//! Forward-chaining inference over the ground rule database.

pub mod database;
pub mod eval;

pub use database::{AtomId, AtomTable, GroundRule, QueryPlan, RuleDatabase};
pub use eval::{evaluate, Interpretation};
