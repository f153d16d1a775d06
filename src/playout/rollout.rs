//! Random rollouts to a terminal state.

use std::time::Instant;

use log::trace;

use crate::core::{GameRng, RoleMap};
use crate::error::{Error, Result};
use crate::game::{JointMove, JointMoves, State};

use super::stats::PlayoutStats;

// =============================================================================
// Rollout Policy
// =============================================================================

/// Chooses the joint move played at each step of a rollout.
pub trait RolloutPolicy: Send + Sync {
    /// Pick one of `moves`, or `None` if there is nothing to pick.
    fn choose(&self, state: &State, moves: &JointMoves, rng: &mut GameRng) -> Option<JointMove>;
}

/// Uniform over all joint moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformRollout;

impl RolloutPolicy for UniformRollout {
    fn choose(&self, _state: &State, moves: &JointMoves, rng: &mut GameRng) -> Option<JointMove> {
        moves.sample(rng)
    }
}

// =============================================================================
// Playouts
// =============================================================================

/// Outcome of one rollout.
#[derive(Clone, Debug)]
pub struct Playout {
    pub goals: RoleMap<i64>,
    /// Joint moves played.
    pub depth: u32,
    pub final_state: State,
}

/// Play uniformly random joint moves from `state` until the game ends.
pub fn playout(state: &State, rng: &mut GameRng) -> Result<RoleMap<i64>> {
    Ok(playout_with_depth(state, rng)?.goals)
}

pub fn playout_with_depth(state: &State, rng: &mut GameRng) -> Result<Playout> {
    playout_with(&UniformRollout, state, rng)
}

/// Roll out with a custom policy.
pub fn playout_with(policy: &impl RolloutPolicy, state: &State, rng: &mut GameRng) -> Result<Playout> {
    let mut current = state.clone();
    let mut depth = 0u32;
    while !current.is_terminal() {
        let moves = current.joint_moves()?;
        let joint = policy
            .choose(&current, &moves, rng)
            .ok_or_else(|| Error::IllegalMove("rollout policy returned no move".into()))?;
        current = current.apply(&joint)?;
        depth += 1;
    }
    let goals = current.goals()?;
    trace!("playout finished after {depth} moves");
    Ok(Playout {
        goals,
        depth,
        final_state: current,
    })
}

/// Run `count` playouts split over `workers` scoped threads.
///
/// Worker `i` draws from `GameRng::new(seed).for_worker(i)`, so the result
/// depends only on the arguments, never on thread scheduling.
pub fn parallel_playouts(state: &State, count: usize, workers: usize, seed: u64) -> Result<PlayoutStats> {
    let workers = workers.clamp(1, count.max(1));
    let root = GameRng::new(seed);
    let started = Instant::now();

    let results: Vec<Result<PlayoutStats>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let share = count / workers + usize::from(i < count % workers);
                let mut rng = root.for_worker(i);
                let state = state.clone();
                scope.spawn(move || PlayoutStats::collect(&state, share, &mut rng))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut total = PlayoutStats::new(state.game().role_count());
    for result in results {
        total.merge(&result?);
    }
    total.time_us = started.elapsed().as_micros() as u64;
    Ok(total)
}
