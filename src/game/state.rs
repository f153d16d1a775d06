//! Game states.
//!
//! A `State` is a set of base facts plus a handle to its [`Game`]. Cloning is
//! O(1): the fact set is a persistent `im::OrdSet` and the game is shared.
//!
//! ## Derived truths
//!
//! `legal`, `goal` and `terminal` are computed together the first time any of
//! them is asked for, then cached in a `OnceLock`. The cache never changes
//! once filled, so a `State` stays `Send + Sync` and equality ignores it.
//!
//! ## Equality
//!
//! States of the same `Game` compare by fact ids. States of different games
//! compare by the case-folded text of their facts, since ids and symbols are
//! numbered per compilation. The hash always follows the text, so equal
//! states hash alike wherever they come from.
//!
//! ## Transitions
//!
//! [`State::apply`] never modifies the receiver: it validates the joint move,
//! evaluates `next` and returns a fresh successor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use im::OrdSet;
use rustc_hash::FxHasher;

use crate::core::{RoleId, RoleMap, Term};
use crate::engine::Interpretation;
use crate::error::{Error, Result};

use super::game::{FactId, Game};
use super::joint::{JointMove, JointMoves, Move};

/// A position of a game.
#[derive(Clone)]
pub struct State {
    game: Arc<Game>,
    facts: OrdSet<FactId>,
    round: u32,
    derived: OnceLock<Arc<Interpretation>>,
    fingerprint: OnceLock<u64>,
}

impl State {
    /// The initial state of `game`.
    #[must_use]
    pub fn new(game: &Arc<Game>) -> Self {
        Self::from_parts(Arc::clone(game), game.initial_facts().clone(), 0)
    }

    pub(crate) fn from_parts(game: Arc<Game>, facts: OrdSet<FactId>, round: u32) -> Self {
        Self {
            game,
            facts,
            round,
            derived: OnceLock::new(),
            fingerprint: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn game(&self) -> &Arc<Game> {
        &self.game
    }

    /// Joint moves applied since the initial state.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Base facts, in a fixed order.
    pub fn facts(&self) -> impl Iterator<Item = &Term> + '_ {
        self.facts.iter().map(|&f| self.game.facts.term(f))
    }

    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn contains_fact(&self, fact: &Term) -> bool {
        self.game
            .facts
            .get(fact)
            .is_some_and(|id| self.facts.contains(&id))
    }

    pub(crate) fn fact_set(&self) -> &OrdSet<FactId> {
        &self.facts
    }

    /// Facts as lowercase text, sorted.
    fn fact_texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self
            .facts()
            .map(|f| self.game.display(f).to_string().to_ascii_lowercase())
            .collect();
        texts.sort_unstable();
        texts
    }

    fn fingerprint(&self) -> u64 {
        *self.fingerprint.get_or_init(|| {
            let mut hasher = FxHasher::default();
            self.fact_texts().hash(&mut hasher);
            hasher.finish()
        })
    }

    fn derived(&self) -> &Interpretation {
        self.derived
            .get_or_init(|| Arc::new(self.game.query(&self.facts)))
    }

    // === Queries ===

    /// Legal moves of one role, possibly empty.
    #[must_use]
    pub fn legal_moves_for(&self, role: RoleId) -> Vec<Move> {
        let interp = self.derived();
        self.game
            .legal_candidates(role)
            .iter()
            .filter(|(atom, _)| interp.holds(*atom))
            .map(|(_, mv)| mv.clone())
            .collect()
    }

    /// Legal moves of every role.
    ///
    /// Fails with `IllegalState` if some role has none.
    pub fn legal_moves(&self) -> Result<RoleMap<Vec<Move>>> {
        let moves = RoleMap::new(self.game.role_count(), |role| self.legal_moves_for(role));
        if let Some((role, _)) = moves.iter().find(|(_, m)| m.is_empty()) {
            return Err(Error::IllegalState {
                role: self.game.role_label(role),
            });
        }
        Ok(moves)
    }

    /// Legal moves as a flat list of `(role, move)` pairs.
    pub fn legal_pairs(&self) -> Result<Vec<(RoleId, Move)>> {
        Ok(self
            .legal_moves()?
            .into_vec()
            .into_iter()
            .enumerate()
            .flat_map(|(i, moves)| moves.into_iter().map(move |m| (RoleId(i as u8), m)))
            .collect())
    }

    #[must_use]
    pub fn is_legal(&self, role: RoleId, mv: &Move) -> bool {
        let interp = self.derived();
        self.game
            .legal_candidates(role)
            .iter()
            .any(|(atom, m)| m == mv && interp.holds(*atom))
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.game
            .terminal_atom()
            .is_some_and(|atom| self.derived().holds(atom))
    }

    /// Score of one role.
    ///
    /// Fails with `GoalUndefined` unless exactly one distinct value holds.
    pub fn goal(&self, role: RoleId) -> Result<i64> {
        let interp = self.derived();
        let mut scores: Vec<i64> = self
            .game
            .goal_candidates(role)
            .iter()
            .filter(|(atom, _)| interp.holds(*atom))
            .map(|&(_, score)| score)
            .collect();
        scores.sort_unstable();
        scores.dedup();
        match scores.as_slice() {
            [score] => Ok(*score),
            _ => Err(Error::GoalUndefined {
                role: self.game.role_label(role),
                scores,
            }),
        }
    }

    pub fn goals(&self) -> Result<RoleMap<i64>> {
        let scores = self
            .game
            .roles()
            .role_ids()
            .map(|role| self.goal(role))
            .collect::<Result<Vec<_>>>()?;
        Ok(RoleMap::from_vec(scores))
    }

    /// Every joint move of this state.
    pub fn joint_moves(&self) -> Result<JointMoves> {
        Ok(JointMoves::new(self.legal_moves()?))
    }

    // === Transitions ===

    /// Successor under `joint`.
    ///
    /// Fails with `IllegalMove` if `joint` does not have one legal move for
    /// every role. The receiver is left untouched either way.
    pub fn apply(&self, joint: &JointMove) -> Result<State> {
        let roles = self.game.role_count();
        if joint.len() != roles {
            return Err(Error::IllegalMove(format!(
                "expected {roles} moves, got {}",
                joint.len()
            )));
        }
        for (role, mv) in joint.iter() {
            if !self.is_legal(role, mv) {
                return Err(Error::IllegalMove(format!(
                    "{} is not legal for {}",
                    self.game.display(mv),
                    self.game.role_label(role)
                )));
            }
        }
        let facts = self.game.successor(&self.facts, joint);
        Ok(Self::from_parts(Arc::clone(&self.game), facts, self.round + 1))
    }

    /// Same as [`apply`](Self::apply), with the joint move given as pairs.
    pub fn apply_pairs(&self, pairs: &[(RoleId, Move)]) -> Result<State> {
        let joint = JointMove::from_pairs(self.game.role_count(), pairs.iter().cloned())?;
        self.apply(&joint)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.game, &other.game) {
            return self.facts == other.facts;
        }
        self.facts.len() == other.facts.len()
            && self.fingerprint() == other.fingerprint()
            && self.fact_texts() == other.fact_texts()
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint());
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("round", &self.round)
            .field("facts", &self.facts.len())
            .finish()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for fact in self.facts() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}", self.game.display(fact))?;
        }
        Ok(())
    }
}
