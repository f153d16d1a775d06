//! Deterministic random number generation for playouts.
//!
//! Every random decision of the playout engine goes through a [`GameRng`]
//! supplied by the caller, so a fixed seed reproduces the same rollouts.
//!
//! ## Parallel playouts
//!
//! ```
//! use rust_ggp::core::GameRng;
//!
//! let root = GameRng::new(7);
//!
//! // One independent stream per worker
//! let items: Vec<u32> = (0..1_000_000).collect();
//! let mut w0 = root.for_worker(0);
//! let mut w1 = root.for_worker(1);
//! assert_ne!(w0.choose(&items), w1.choose(&items));
//!
//! // Same seed and worker index gives the same stream
//! assert_eq!(root.for_worker(0).state(), GameRng::new(7).for_worker(0).state());
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seedable ChaCha8 generator with independent per-worker streams.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Independent stream for worker `index`, without touching `self`.
    #[must_use]
    pub fn for_worker(&self, index: usize) -> Self {
        Self::new(mix(self.seed ^ GOLDEN.rotate_left(17), index as u64 + 1))
    }

    /// Uniform element of `slice`, `None` if it is empty.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Snapshot for checkpointing.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

fn mix(seed: u64, n: u64) -> u64 {
    seed.wrapping_add(n.wrapping_mul(GOLDEN))
}

/// Serializable position of a [`GameRng`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    /// ChaCha8 word position
    pub word_pos: u128,
}
