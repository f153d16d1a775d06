//! Aggregate statistics over many playouts.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::{GameRng, RoleId, RoleMap};
use crate::error::Result;
use crate::game::State;

use super::rollout::{playout_with_depth, Playout};

/// Statistics collected over a batch of playouts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayoutStats {
    /// Playouts completed.
    pub playouts: u64,

    /// Sum of playout depths (joint moves).
    pub depth_sum: u64,

    /// Sum of squared depths, for the variance.
    pub depth_sq_sum: u64,

    /// Deepest playout seen.
    pub max_depth: u32,

    /// Per-role sum of final scores.
    pub score_sums: RoleMap<i64>,

    /// Total time spent (microseconds).
    pub time_us: u64,
}

impl PlayoutStats {
    #[must_use]
    pub fn new(role_count: usize) -> Self {
        Self {
            playouts: 0,
            depth_sum: 0,
            depth_sq_sum: 0,
            max_depth: 0,
            score_sums: RoleMap::with_value(role_count, 0),
            time_us: 0,
        }
    }

    /// Run `count` playouts from `state`.
    pub fn collect(state: &State, count: usize, rng: &mut GameRng) -> Result<Self> {
        let mut stats = Self::new(state.game().role_count());
        let started = Instant::now();
        for _ in 0..count {
            stats.record(&playout_with_depth(state, rng)?);
        }
        stats.time_us = started.elapsed().as_micros() as u64;
        Ok(stats)
    }

    pub fn record(&mut self, playout: &Playout) {
        let depth = u64::from(playout.depth);
        self.playouts += 1;
        self.depth_sum += depth;
        self.depth_sq_sum += depth * depth;
        self.max_depth = self.max_depth.max(playout.depth);
        for (role, score) in playout.goals.iter() {
            self.score_sums[role] += *score;
        }
    }

    /// Fold another batch in. Times add up.
    pub fn merge(&mut self, other: &PlayoutStats) {
        self.playouts += other.playouts;
        self.depth_sum += other.depth_sum;
        self.depth_sq_sum += other.depth_sq_sum;
        self.max_depth = self.max_depth.max(other.max_depth);
        for (role, sum) in other.score_sums.iter() {
            if let Some(total) = self.score_sums.get_mut(role) {
                *total += *sum;
            }
        }
        self.time_us += other.time_us;
    }

    #[must_use]
    pub fn mean_depth(&self) -> f64 {
        if self.playouts == 0 {
            0.0
        } else {
            self.depth_sum as f64 / self.playouts as f64
        }
    }

    #[must_use]
    pub fn depth_std_dev(&self) -> f64 {
        if self.playouts == 0 {
            return 0.0;
        }
        let n = self.playouts as f64;
        let mean = self.depth_sum as f64 / n;
        (self.depth_sq_sum as f64 / n - mean * mean).max(0.0).sqrt()
    }

    #[must_use]
    pub fn mean_score(&self, role: RoleId) -> f64 {
        if self.playouts == 0 {
            0.0
        } else {
            self.score_sums[role] as f64 / self.playouts as f64
        }
    }

    #[must_use]
    pub fn playouts_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.playouts as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }
}
