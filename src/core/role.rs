//! Role identification and per-role data storage.
//!
//! ## RoleId
//!
//! Dense 0-based index of a role, in the order the `role` facts of the
//! description are declared. At most 255 roles are supported.
//!
//! ## RoleMap
//!
//! One value per role, backed by a `Vec` for O(1) access. Legal moves, goals
//! and joint moves are all `RoleMap`s.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Index of a role within its game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub u8);

impl RoleId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw 0-based index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over the roles of a game with `role_count` roles.
    ///
    /// ```
    /// use rust_ggp::core::RoleId;
    ///
    /// let roles: Vec<_> = RoleId::all(2).collect();
    /// assert_eq!(roles, vec![RoleId::new(0), RoleId::new(1)]);
    /// ```
    pub fn all(role_count: usize) -> impl Iterator<Item = RoleId> {
        (0..role_count as u8).map(RoleId)
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "role #{}", self.0)
    }
}

/// Per-role values indexed by [`RoleId`].
///
/// ```
/// use rust_ggp::core::{RoleId, RoleMap};
///
/// let mut scores: RoleMap<i64> = RoleMap::with_value(2, 0);
/// scores[RoleId::new(1)] = 100;
/// assert_eq!(scores.as_slice(), &[0, 100]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleMap<T> {
    data: Vec<T>,
}

impl<T> RoleMap<T> {
    /// Build a map by calling `factory` for each role.
    pub fn new(role_count: usize, factory: impl FnMut(RoleId) -> T) -> Self {
        assert!(role_count <= 255, "At most 255 roles supported");
        Self {
            data: RoleId::all(role_count).map(factory).collect(),
        }
    }

    /// Wrap a vector holding one value per role, in role order.
    #[must_use]
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(data.len() <= 255, "At most 255 roles supported");
        Self { data }
    }

    pub fn with_value(role_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(role_count, |_| value.clone())
    }

    pub fn with_default(role_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(role_count, |_| T::default())
    }

    /// Number of roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn get(&self, role: RoleId) -> Option<&T> {
        self.data.get(role.index())
    }

    pub fn get_mut(&mut self, role: RoleId) -> Option<&mut T> {
        self.data.get_mut(role.index())
    }

    /// Iterate over `(RoleId, &T)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (RoleId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (RoleId(i as u8), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Apply `f` to every value, keeping the role order.
    pub fn map<U>(&self, mut f: impl FnMut(RoleId, &T) -> U) -> RoleMap<U> {
        RoleMap {
            data: self.iter().map(|(r, v)| f(r, v)).collect(),
        }
    }

    pub fn role_ids(&self) -> impl Iterator<Item = RoleId> {
        RoleId::all(self.data.len())
    }
}

impl<T> Index<RoleId> for RoleMap<T> {
    type Output = T;

    fn index(&self, role: RoleId) -> &Self::Output {
        &self.data[role.index()]
    }
}

impl<T> IndexMut<RoleId> for RoleMap<T> {
    fn index_mut(&mut self, role: RoleId) -> &mut Self::Output {
        &mut self.data[role.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_id_basics() {
        let r1 = RoleId::new(1);
        assert_eq!(r1.index(), 1);
        assert_eq!(r1.to_string(), "role #1");
        assert!(RoleId::new(0) < r1);
    }

    #[test]
    fn test_role_map_new_and_index() {
        let map: RoleMap<usize> = RoleMap::new(3, |r| r.index() * 10);
        assert_eq!(map[RoleId::new(2)], 20);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(RoleId::new(3)), None);
    }

    #[test]
    fn test_role_map_map_and_iter() {
        let map = RoleMap::from_vec(vec!["a", "bb"]);
        let lens = map.map(|_, s| s.len());
        let pairs: Vec<_> = lens.iter().collect();
        assert_eq!(pairs, vec![(RoleId::new(0), &1), (RoleId::new(1), &2)]);
    }

    #[test]
    fn test_role_map_serialization() {
        let map: RoleMap<i64> = RoleMap::from_vec(vec![100, 0]);
        let json = serde_json::to_string(&map).unwrap();
        let back: RoleMap<i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
