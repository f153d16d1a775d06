//! # rust-ggp
//!
//! A General Game Playing state machine: compiles game descriptions written in
//! GDL and plays them.
//!
//! ## Design Principles
//!
//! 1. **Compile once, query often**: parsing, stratification and grounding run
//!    once per game. States only run propositional inference.
//!
//! 2. **N-Role, Simultaneous**: every turn is a joint move with one move per
//!    role. Turn-taking games express waiting roles with `noop`.
//!
//! 3. **Pure transitions**: `State::apply` returns a new state; a state is
//!    never modified after creation.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: a state's base facts live in an
//!   `im::OrdSet`, so cloning a state for a playout is O(1).
//!
//! - **Stratified semi-naive evaluation**: derived predicates are computed
//!   component by component with per-rule counters, each atom once.
//!
//! - **Injected randomness**: playouts take an explicit `GameRng`.
//!
//! ## Modules
//!
//! - `core`: Symbols, terms, roles, RNG
//! - `gdl`: Lexer, parser, clauses and compiler hints
//! - `compile`: Stratification and grounding
//! - `engine`: Ground rule database and inference
//! - `game`: `Game`, `State`, joint moves, portable snapshots
//! - `playout`: Random rollouts and statistics
//!
//! ## Example
//!
//! ```
//! use rust_ggp::{GameRng, Game, State};
//!
//! let game = Game::from_description("
//!     (role player)
//!     (init (count 0))
//!     (succ 0 1) (succ 1 2)
//!     (<= (legal player inc) (true (count ?x)) (succ ?x ?y))
//!     (<= (next (count ?y)) (true (count ?x)) (succ ?x ?y))
//!     (<= terminal (true (count 2)))
//!     (<= (goal player 100) (true (count 2)))
//!     (<= (goal player 0) (not (true (count 2))))
//! ").unwrap();
//!
//! let state = State::new(&game);
//! assert!(!state.is_terminal());
//!
//! let goals = rust_ggp::playout(&state, &mut GameRng::new(42)).unwrap();
//! assert_eq!(goals.as_slice(), &[100]);
//! ```

pub mod core;
pub mod error;
pub mod gdl;
pub mod compile;
pub mod engine;
pub mod game;
pub mod playout;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{
    RoleId, RoleMap,
    GameRng, GameRngState,
    Symbol, SymbolTable, Term,
};

pub use crate::error::{Error, Result};

pub use crate::compile::CompileConfig;

pub use crate::game::{
    Game, State, FactId,
    Move, JointMove, JointMoves,
    PortableState,
};

pub use crate::playout::{
    playout, playout_with, playout_with_depth, parallel_playouts,
    Playout, PlayoutStats, RolloutPolicy, UniformRollout,
};
