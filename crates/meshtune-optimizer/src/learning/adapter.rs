//! Episodic tabular Q-learning over the live snapshot
//!
//! Actions are drawn uniformly at random every episode. The table's
//! max-over-actions only feeds the bootstrap target; it never picks the
//! action. State transitions are deterministic: `s' = (s + 1) mod STATES`.

use meshtune_common::{
    MetricDelta, MetricSnapshot, NumericDegenerate, Result, TopologyTag, ACTIONS,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::SimulationState;
use crate::config::RlSettings;
use crate::fitness::FitnessCalculator;

/// Learning parameters
#[derive(Debug, Clone, Copy)]
pub struct RlParams {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub delta: MetricDelta,
}

impl From<&RlSettings> for RlParams {
    fn from(s: &RlSettings) -> Self {
        Self {
            learning_rate: s.learning_rate,
            discount_factor: s.discount_factor,
            delta: s.delta,
        }
    }
}

impl Default for RlParams {
    fn default() -> Self {
        Self::from(&RlSettings::default())
    }
}

/// Outcome of one episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReport {
    /// 1-based episode index
    pub episode: u32,
    pub state: usize,
    pub next_state: usize,
    pub action: usize,
    pub reward: f64,
    /// Q(state, action) after the update
    pub q_value: f64,
    /// Topology after the advance
    pub topology: TopologyTag,
    /// Live snapshot after the synthetic step
    pub metrics: MetricSnapshot,
}

pub struct RlAdapter {
    params: RlParams,
    calculator: FitnessCalculator,
}

impl RlAdapter {
    pub fn new(params: RlParams, calculator: FitnessCalculator) -> Self {
        Self { params, calculator }
    }

    pub fn params(&self) -> &RlParams {
        &self.params
    }

    /// Seed every entry with half the fitness of the live snapshot
    pub fn seed_table(&self, sim: &mut SimulationState) -> Result<f64> {
        let value = 0.5 * self.calculator.checked_score(&sim.metrics)?;
        sim.q_table.fill(value);
        debug!(value, "Seeded Q-table");
        Ok(value)
    }

    /// Run one episode against the driver-owned state
    ///
    /// On a non-finite reward or Q value the table and snapshot are left as
    /// they were before the call.
    pub fn step<R: Rng + ?Sized>(
        &self,
        sim: &mut SimulationState,
        rng: &mut R,
    ) -> Result<EpisodeReport> {
        let episode = sim.episode + 1;
        let state = sim.state;
        let next_state = sim.next_state();
        let action = rng.gen_range(0..ACTIONS);

        let reward = self.calculator.reward(&sim.metrics);
        if !reward.is_finite() {
            return Err(NumericDegenerate::NonFiniteReward { episode }.into());
        }

        let previous = sim.q_table.get(state, action);
        let q_value = sim.q_table.update(
            state,
            action,
            reward,
            next_state,
            self.params.learning_rate,
            self.params.discount_factor,
        );
        if !q_value.is_finite() {
            sim.q_table.set(state, action, previous);
            return Err(NumericDegenerate::NonFiniteQValue { state, action }.into());
        }

        sim.metrics.apply(&self.params.delta);
        sim.topology.advance();
        sim.state = next_state;
        sim.episode = episode;

        debug!(episode, state, action, reward, q_value, "Episode step");

        Ok(EpisodeReport {
            episode,
            state,
            next_state,
            action,
            reward,
            q_value,
            topology: sim.topology,
            metrics: sim.metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::fitness;
    use meshtune_common::{MeshtuneError, STATES};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn adapter() -> RlAdapter {
        RlAdapter::new(RlParams::default(), FitnessCalculator::default())
    }

    #[test]
    fn test_seed_uses_half_fitness() {
        let mut sim = SimulationState::new(MetricSnapshot::default());
        let v = adapter().seed_table(&mut sim).unwrap();
        assert_eq!(v, 0.5 * fitness(0.6, 0.85, 200.0));
        assert!(sim.q_table.iter().all(|(_, _, q)| q == v));
    }

    #[test]
    fn test_first_update_touches_one_cell() {
        let adapter = adapter();
        let mut sim = SimulationState::new(MetricSnapshot::default());
        let v = adapter.seed_table(&mut sim).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let report = adapter.step(&mut sim, &mut rng).unwrap();
        assert_eq!(report.state, 0);
        assert_eq!(report.next_state, 1);
        for (s, a, q) in sim.q_table.iter() {
            if (s, a) == (0, report.action) {
                assert_ne!(q, v);
                assert_eq!(q, report.q_value);
            } else {
                assert_eq!(q, v);
            }
        }
    }

    #[test]
    fn test_update_matches_rule() {
        let adapter = adapter();
        let mut sim = SimulationState::new(MetricSnapshot::default());
        let v = adapter.seed_table(&mut sim).unwrap();
        let reward = FitnessCalculator::default().reward(&sim.metrics);

        let report = adapter.step(&mut sim, &mut StdRng::seed_from_u64(0)).unwrap();
        let expected = v + 0.1 * (reward + 0.9 * v - v);
        assert!((report.q_value - expected).abs() < 1e-9);
        assert_eq!(report.reward, reward);
    }

    #[test]
    fn test_indices_stay_in_range() {
        let adapter = adapter();
        let mut sim = SimulationState::new(MetricSnapshot::default());
        adapter.seed_table(&mut sim).unwrap();
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..(3 * STATES) {
            let report = adapter.step(&mut sim, &mut rng).unwrap();
            assert!(report.state < STATES);
            assert!(report.next_state < STATES);
            assert!(report.action < ACTIONS);
        }
        assert_eq!(sim.state, 0);
        assert_eq!(sim.episode, 150);
    }

    #[test]
    fn test_topology_cycles_every_five() {
        let adapter = adapter();
        let mut sim = SimulationState::new(MetricSnapshot::default());
        adapter.seed_table(&mut sim).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let start = sim.topology;

        for i in 1..=5 {
            adapter.step(&mut sim, &mut rng).unwrap();
            if i < 5 {
                assert_ne!(sim.topology, start);
            }
        }
        assert_eq!(sim.topology, start);
    }

    #[test]
    fn test_non_finite_reward_leaves_state_untouched() {
        let adapter = adapter();
        let mut sim = SimulationState::new(MetricSnapshot::new(f64::INFINITY, 0.85, 200.0));
        let before = sim.q_table.clone();
        let err = adapter.step(&mut sim, &mut StdRng::seed_from_u64(1));
        assert!(err.is_err());
        assert_eq!(sim.q_table, before);
        assert_eq!(sim.episode, 0);
        assert_eq!(sim.topology, TopologyTag::Random);
    }

    #[test]
    fn test_overflowing_update_is_reverted() {
        let adapter = adapter();
        let mut sim = SimulationState::new(MetricSnapshot::default());
        sim.q_table.fill(-f64::MAX);
        for a in 0..ACTIONS {
            sim.q_table.set(1, a, f64::MAX);
        }
        let before = sim.q_table.clone();
        assert!(adapter.calculator.reward(&sim.metrics).is_finite());

        let err = adapter
            .step(&mut sim, &mut StdRng::seed_from_u64(6))
            .unwrap_err();
        assert!(matches!(
            err,
            MeshtuneError::Numeric(NumericDegenerate::NonFiniteQValue { state: 0, .. })
        ));
        assert_eq!(sim.q_table, before);
        assert_eq!(sim.metrics, MetricSnapshot::default());
        assert_eq!(sim.episode, 0);
        assert_eq!(sim.state, 0);
    }
}
