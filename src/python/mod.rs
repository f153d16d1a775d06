//! Python bindings for the rust-ggp state machine.
//!
//! # Quick Start
//!
//! ```python
//! import rust_ggp as ggp
//!
//! game = ggp.Game(open("tictactoe.gdl").read())
//! state = ggp.State(game)
//!
//! while not state.is_terminal():
//!     state.play(state.joints()[0])
//!
//! print(state.goals())
//! saved = ggp.PortableState(state)
//! assert ggp.State(ggp.Game.from_file("tictactoe.gdl"), saved) == state
//! print(ggp.State(game).playout(seed=7))
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::Error;

mod py_core;
mod py_games;

pub use py_core::*;
pub use py_games::*;

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// rust-ggp: compile GDL games and play them.
#[pymodule]
fn rust_ggp(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPlayer>()?;
    m.add_class::<PyMove>()?;
    m.add_class::<PyJointMove>()?;
    m.add_class::<PyGame>()?;
    m.add_class::<PyState>()?;
    m.add_class::<PyPortableState>()?;
    Ok(())
}
