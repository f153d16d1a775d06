//! Public state-machine API: compiled games, states and joint moves.

pub mod game;
pub mod joint;
pub mod portable;
pub mod state;

pub use game::{FactId, Game};
pub use joint::{JointMove, JointMoves, Move};
pub use portable::PortableState;
pub use state::State;
