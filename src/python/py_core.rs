//! Core type bindings for Python.

use pyo3::prelude::*;

use crate::core::{RoleId, Term};
use crate::game::{JointMove, Move};

/// Python wrapper for a role.
#[pyclass(name = "Player")]
#[derive(Clone, Debug)]
pub struct PyPlayer {
    pub(crate) id: RoleId,
    pub(crate) name: String,
}

#[pymethods]
impl PyPlayer {
    /// Role index (0-based, declaration order).
    fn index(&self) -> usize {
        self.id.index()
    }

    #[getter]
    fn name(&self) -> &str {
        &self.name
    }

    fn __repr__(&self) -> String {
        format!("Player({})", self.name)
    }

    fn __str__(&self) -> String {
        self.name.clone()
    }

    fn __eq__(&self, other: &Self) -> bool {
        self.id == other.id
    }

    fn __hash__(&self) -> u64 {
        u64::from(self.id.0)
    }
}

/// Python wrapper for a move term.
#[pyclass(name = "Move")]
#[derive(Clone, Debug)]
pub struct PyMove {
    pub(crate) term: Term,
    pub(crate) text: String,
}

impl PyMove {
    pub(crate) fn new(term: Move, text: String) -> Self {
        Self { term, text }
    }
}

#[pymethods]
impl PyMove {
    fn __repr__(&self) -> String {
        format!("Move({})", self.text)
    }

    fn __str__(&self) -> String {
        self.text.clone()
    }

    fn __eq__(&self, other: &Self) -> bool {
        self.term == other.term
    }

    fn __hash__(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        self.term.hash(&mut hasher);
        hasher.finish()
    }
}

/// Python wrapper for a joint move.
#[pyclass(name = "JointMove")]
#[derive(Clone, Debug)]
pub struct PyJointMove {
    pub(crate) joint: JointMove,
    pub(crate) labels: Vec<(String, String)>,
}

#[pymethods]
impl PyJointMove {
    /// `(player, move)` pairs in role order.
    fn pairs(&self) -> Vec<(String, String)> {
        self.labels.clone()
    }

    fn __len__(&self) -> usize {
        self.joint.len()
    }

    fn __repr__(&self) -> String {
        let parts: Vec<String> = self
            .labels
            .iter()
            .map(|(p, m)| format!("{p}: {m}"))
            .collect();
        format!("JointMove({})", parts.join(", "))
    }
}
