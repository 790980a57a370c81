//! Dense fixed-size Q-table
//!
//! `S × A` values stored inline; dimensions are part of the type and never
//! change after construction.

use meshtune_common::{ACTIONS, STATES};

#[derive(Debug, Clone, PartialEq)]
pub struct QTable<const S: usize = STATES, const A: usize = ACTIONS> {
    values: [[f64; A]; S],
}

impl<const S: usize, const A: usize> Default for QTable<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const S: usize, const A: usize> QTable<S, A> {
    pub const STATES: usize = S;
    pub const ACTIONS: usize = A;

    /// Zero-initialized table
    pub fn new() -> Self {
        Self {
            values: [[0.0; A]; S],
        }
    }

    /// Set every entry to `value`
    pub fn fill(&mut self, value: f64) {
        for row in self.values.iter_mut() {
            row.fill(value);
        }
    }

    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[state][action]
    }

    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        self.values[state][action] = value;
    }

    pub fn row(&self, state: usize) -> &[f64; A] {
        &self.values[state]
    }

    /// Largest action value in `state`
    pub fn max_value(&self, state: usize) -> f64 {
        self.values[state]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Temporal-difference target `reward + γ·max_a' Q(next, a')`
    pub fn td_target(&self, reward: f64, gamma: f64, next_state: usize) -> f64 {
        reward + gamma * self.max_value(next_state)
    }

    /// Apply `Q(s,a) += α·(target − Q(s,a))` and return the new value
    pub fn update(
        &mut self,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
        alpha: f64,
        gamma: f64,
    ) -> f64 {
        let target = self.td_target(reward, gamma, next_state);
        let cell = &mut self.values[state][action];
        *cell += alpha * (target - *cell);
        *cell
    }

    /// Iterate `(state, action, value)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .flat_map(|(s, row)| row.iter().enumerate().map(move |(a, &v)| (s, a, v)))
    }
}
