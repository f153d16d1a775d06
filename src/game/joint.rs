//! Joint moves and their enumeration.
//!
//! ## JointMove
//!
//! One move per role. Built either from a complete [`RoleMap`] or from a
//! list of `(RoleId, Move)` pairs, which is checked for duplicates and gaps.
//!
//! ## JointMoves
//!
//! The Cartesian product of the per-role legal moves, addressed as a
//! mixed-radix number whose lowest digit is role 0:
//!
//! ```text
//! index = d0 + n0 * (d1 + n1 * (d2 + ...))
//! ```
//!
//! Enumeration is stateless: every combination is decoded from its index, so
//! iterating twice yields the same sequence.
//!
//! A product that does not fit in `usize` has no exact [`JointMoves::len`].
//! [`JointMoves::checked_len`] reports it as `None`; `iter` and `get` still
//! reach only the first `usize::MAX` combinations, while `sample` draws from
//! all of them.

use std::ops::Index;

use crate::core::{GameRng, RoleId, RoleMap, Term};
use crate::error::{Error, Result};

/// A move is any ground term.
pub type Move = Term;

/// One move for every role.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JointMove {
    moves: RoleMap<Move>,
}

impl JointMove {
    /// Assemble a joint move from pairs, each role exactly once.
    pub fn from_pairs(
        role_count: usize,
        pairs: impl IntoIterator<Item = (RoleId, Move)>,
    ) -> Result<Self> {
        let mut slots: Vec<Option<Move>> = vec![None; role_count];
        for (role, mv) in pairs {
            let slot = slots
                .get_mut(role.index())
                .ok_or_else(|| Error::IllegalMove(format!("{role} does not exist")))?;
            if slot.replace(mv).is_some() {
                return Err(Error::IllegalMove(format!("{role} moves twice")));
            }
        }
        let moves = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| Error::IllegalMove(format!("{} has no move", RoleId(i as u8))))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            moves: RoleMap::from_vec(moves),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[must_use]
    pub fn get(&self, role: RoleId) -> Option<&Move> {
        self.moves.get(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoleId, &Move)> {
        self.moves.iter()
    }

    #[must_use]
    pub fn as_map(&self) -> &RoleMap<Move> {
        &self.moves
    }
}

impl From<RoleMap<Move>> for JointMove {
    fn from(moves: RoleMap<Move>) -> Self {
        Self { moves }
    }
}

impl Index<RoleId> for JointMove {
    type Output = Move;

    fn index(&self, role: RoleId) -> &Move {
        &self.moves[role]
    }
}

/// All joint moves over a set of per-role legal moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JointMoves {
    legal: RoleMap<Vec<Move>>,
}

impl JointMoves {
    #[must_use]
    pub fn new(legal: RoleMap<Vec<Move>>) -> Self {
        Self { legal }
    }

    /// The per-role move lists the product is taken over.
    #[must_use]
    pub fn legal(&self) -> &RoleMap<Vec<Move>> {
        &self.legal
    }

    /// Number of combinations, `None` if it overflows `usize`.
    #[must_use]
    pub fn checked_len(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        self.legal
            .values()
            .try_fold(1usize, |acc, moves| acc.checked_mul(moves.len()))
    }

    /// Number of combinations, saturating at `usize::MAX`.
    ///
    /// Use [`checked_len`](Self::checked_len) to tell an exact count from a
    /// saturated one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Whether some role has no move at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legal.values().any(Vec::is_empty)
    }

    /// Decode combination `index`.
    #[must_use]
    pub fn get(&self, mut index: usize) -> Option<JointMove> {
        if index >= self.len() {
            return None;
        }
        let moves = self.legal.map(|_, options| {
            let digit = index % options.len();
            index /= options.len();
            options[digit].clone()
        });
        Some(JointMove { moves })
    }

    /// Index of `joint`, if every move is one of the options.
    #[must_use]
    pub fn position(&self, joint: &JointMove) -> Option<usize> {
        if joint.len() != self.legal.len() {
            return None;
        }
        let mut index = 0usize;
        let mut stride = 1usize;
        for (role, options) in self.legal.iter() {
            let digit = options.iter().position(|m| *m == joint[role])?;
            index = index.checked_add(digit.checked_mul(stride)?)?;
            stride = stride.checked_mul(options.len())?;
        }
        Some(index)
    }

    /// Every combination, role 0 varying fastest.
    ///
    /// Stops after `usize::MAX` combinations when
    /// [`checked_len`](Self::checked_len) is `None`.
    pub fn iter(&self) -> impl Iterator<Item = JointMove> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Uniformly random combination; `None` if some role has no move.
    pub fn sample(&self, rng: &mut GameRng) -> Option<JointMove> {
        // Independent uniform digits give a uniform product.
        let moves = self
            .legal
            .values()
            .map(|options| rng.choose(options).cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(JointMove {
            moves: RoleMap::from_vec(moves),
        })
    }
}
