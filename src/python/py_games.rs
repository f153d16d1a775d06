//! Game and state bindings for Python.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use pyo3::prelude::*;

use crate::core::{GameRng, RoleId, RoleMap};
use crate::game::{Game, JointMove, PortableState, State};
use crate::playout::playout;

use super::py_core::{PyJointMove, PyMove, PyPlayer};

/// Python wrapper for a compiled game.
#[pyclass(name = "Game")]
#[derive(Clone)]
pub struct PyGame {
    pub(crate) game: Arc<Game>,
}

#[pymethods]
impl PyGame {
    /// Compile a game from description text.
    #[new]
    fn new(gdl: &str) -> PyResult<Self> {
        Ok(Self {
            game: Game::from_description(gdl)?,
        })
    }

    /// Compile a game from a description file.
    #[staticmethod]
    fn from_file(path: &str) -> PyResult<Self> {
        Ok(Self {
            game: Game::from_file(path)?,
        })
    }

    fn players(&self) -> Vec<PyPlayer> {
        players(&self.game)
    }

    fn num_players(&self) -> usize {
        self.game.role_count()
    }

    /// The initial state.
    fn initial_state(&self) -> PyState {
        PyState {
            state: State::new(&self.game),
        }
    }

    fn __repr__(&self) -> String {
        let names: Vec<String> = players(&self.game).into_iter().map(|p| p.name).collect();
        format!("Game(players=[{}])", names.join(", "))
    }
}

fn players(game: &Game) -> Vec<PyPlayer> {
    game.roles()
        .iter()
        .map(|(id, term)| PyPlayer {
            id,
            name: game.display(term).to_string(),
        })
        .collect()
}

fn goal_map(game: &Game, goals: &RoleMap<i64>) -> HashMap<String, i64> {
    goals
        .iter()
        .map(|(role, score)| (game.display(game.role_name(role)).to_string(), *score))
        .collect()
}

/// Anything `State.play` accepts as a joint move.
#[derive(FromPyObject)]
enum JointArg {
    Joint(PyJointMove),
    /// `{"white": "(mark 1 1)", "black": "noop"}`
    Names(HashMap<String, String>),
    Pairs(Vec<(PyPlayer, PyMove)>),
    Texts(Vec<(String, String)>),
}

impl JointArg {
    fn resolve(self, game: &Game) -> PyResult<JointMove> {
        let joint = match self {
            JointArg::Joint(joint) => joint.joint,
            JointArg::Names(names) => {
                game.parse_joint(names.iter().map(|(r, m)| (r.as_str(), m.as_str())))?
            }
            JointArg::Pairs(pairs) => JointMove::from_pairs(
                game.role_count(),
                pairs.into_iter().map(|(p, m)| (p.id, m.term)),
            )?,
            JointArg::Texts(texts) => {
                game.parse_joint(texts.iter().map(|(r, m)| (r.as_str(), m.as_str())))?
            }
        };
        Ok(joint)
    }
}

/// Python wrapper for a mutable game position.
///
/// `play` replaces the wrapped state with its successor; use `copy` first to
/// keep the current one.
#[pyclass(name = "State")]
pub struct PyState {
    state: State,
}

#[pymethods]
impl PyState {
    /// Initial state of `game`, or the position saved in `portable`.
    #[new]
    #[pyo3(signature = (game, portable = None))]
    fn new(game: &PyGame, portable: Option<PyRef<'_, PyPortableState>>) -> PyResult<Self> {
        let state = match portable {
            None => State::new(&game.game),
            Some(saved) => State::from_portable(&game.game, &saved.portable)?,
        };
        Ok(Self { state })
    }

    fn to_portable(&self) -> PyPortableState {
        PyPortableState {
            portable: self.state.to_portable(),
        }
    }

    fn players(&self) -> Vec<PyPlayer> {
        players(self.state.game())
    }

    fn num_players(&self) -> usize {
        self.state.game().role_count()
    }

    /// Legal `(player, move)` pairs.
    fn legals(&self) -> PyResult<Vec<(PyPlayer, PyMove)>> {
        let game = self.state.game();
        let everyone = players(game);
        Ok(self
            .state
            .legal_pairs()?
            .into_iter()
            .map(|(role, mv)| {
                let text = game.display(&mv).to_string();
                (everyone[role.index()].clone(), PyMove::new(mv, text))
            })
            .collect())
    }

    /// Every joint move.
    fn joints(&self) -> PyResult<Vec<PyJointMove>> {
        let game = self.state.game();
        Ok(self
            .state
            .joint_moves()?
            .iter()
            .map(|joint| wrap_joint(game, joint))
            .collect())
    }

    /// Build a joint move from one move per player.
    fn joint(&self, moves: Vec<(PyPlayer, PyMove)>) -> PyResult<PyJointMove> {
        let game = self.state.game();
        let joint = JointMove::from_pairs(
            game.role_count(),
            moves.into_iter().map(|(p, m)| (p.id, m.term)),
        )?;
        Ok(wrap_joint(game, joint))
    }

    /// Advance this state by one joint move.
    ///
    /// Accepts a `JointMove`, a `{player name: move text}` dict, or a list of
    /// `(Player, Move)` or `(name, text)` pairs.
    fn play(&mut self, joint: JointArg) -> PyResult<()> {
        let joint = joint.resolve(self.state.game())?;
        self.state = self.state.apply(&joint)?;
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn goals(&self) -> PyResult<HashMap<String, i64>> {
        Ok(goal_map(self.state.game(), &self.state.goals()?))
    }

    /// Random playout to the end; this state is not modified.
    #[pyo3(signature = (seed = 42))]
    fn playout(&self, seed: u64) -> PyResult<HashMap<String, i64>> {
        let mut rng = GameRng::new(seed);
        let goals = playout(&self.state, &mut rng)?;
        Ok(goal_map(self.state.game(), &goals))
    }

    #[getter]
    fn round(&self) -> u32 {
        self.state.round()
    }

    fn copy(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }

    fn __eq__(&self, other: &Self) -> bool {
        self.state == other.state
    }

    fn __hash__(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.state.hash(&mut hasher);
        hasher.finish()
    }

    fn __repr__(&self) -> String {
        format!("State(round={}, facts=[{}])", self.state.round(), self.state)
    }
}

/// Immutable, hashable snapshot of a state that any compilation of the same
/// description can load.
#[pyclass(name = "PortableState", frozen)]
#[derive(Clone)]
pub struct PyPortableState {
    portable: PortableState,
}

impl PyPortableState {
    fn folded(&self) -> Vec<String> {
        let mut facts: Vec<String> = self
            .portable
            .facts
            .iter()
            .map(|f| f.to_ascii_lowercase())
            .collect();
        facts.sort_unstable();
        facts
    }
}

#[pymethods]
impl PyPortableState {
    #[new]
    fn new(state: &PyState) -> Self {
        state.to_portable()
    }

    #[getter]
    fn facts(&self) -> Vec<String> {
        self.portable.facts.clone()
    }

    #[getter]
    fn round(&self) -> u32 {
        self.portable.round
    }

    fn __eq__(&self, other: &Self) -> bool {
        self.folded() == other.folded()
    }

    fn __hash__(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.folded().hash(&mut hasher);
        hasher.finish()
    }

    fn __repr__(&self) -> String {
        format!(
            "PortableState(round={}, facts=[{}])",
            self.portable.round,
            self.portable.facts.join(" ")
        )
    }
}

fn wrap_joint(game: &Game, joint: JointMove) -> PyJointMove {
    let labels = joint
        .iter()
        .map(|(role, mv): (RoleId, _)| {
            (
                game.display(game.role_name(role)).to_string(),
                game.display(mv).to_string(),
            )
        })
        .collect();
    PyJointMove { joint, labels }
}
