//! Randomized playouts and their statistics.
//!
//! Randomness is always passed in as a [`GameRng`](crate::core::GameRng);
//! the same seed replays the same games.

pub mod rollout;
pub mod stats;

pub use rollout::{
    parallel_playouts, playout, playout_with, playout_with_depth, Playout, RolloutPolicy,
    UniformRollout,
};
pub use stats::PlayoutStats;
