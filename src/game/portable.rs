//! Game-independent snapshots of a state.
//!
//! A [`PortableState`] stores facts as text, so it survives recompiling the
//! description (symbol and fact numbering may differ between compilations)
//! and can be written with any serde format or with [`bincode`].

use std::sync::Arc;

use im::OrdSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::game::{FactId, Game};
use super::state::State;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableState {
    /// Base facts as description text, e.g. `(cell 1 1 b)`.
    pub facts: Vec<String>,
    pub round: u32,
}

impl PortableState {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl State {
    #[must_use]
    pub fn to_portable(&self) -> PortableState {
        PortableState {
            facts: self
                .facts()
                .map(|f| self.game().display(f).to_string())
                .collect(),
            round: self.round(),
        }
    }

    /// Rebuild a state of `game`.
    ///
    /// Fails with `UnknownFact` if a fact can never hold in `game`.
    pub fn from_portable(game: &Arc<Game>, portable: &PortableState) -> Result<State> {
        let mut facts: OrdSet<FactId> = OrdSet::new();
        for text in &portable.facts {
            facts.insert(game.fact_from_text(text)?);
        }
        Ok(State::from_parts(Arc::clone(game), facts, portable.round))
    }
}
