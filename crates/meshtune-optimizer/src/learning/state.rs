//! Simulation state aggregate owned by the driver

use meshtune_common::{MetricSnapshot, TopologyTag, STATES};
use serde::{Deserialize, Serialize};

use super::q_table::QTable;

/// Live metrics, learned values and counters for one run
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Live snapshot, mutated once per episode
    pub metrics: MetricSnapshot,
    pub topology: TopologyTag,
    pub q_table: QTable,
    /// Current state index, always in `[0, STATES)`
    pub state: usize,
    /// Episodes completed
    pub episode: u32,
}

impl SimulationState {
    pub fn new(metrics: MetricSnapshot) -> Self {
        Self {
            metrics,
            topology: TopologyTag::default(),
            q_table: QTable::new(),
            state: 0,
            episode: 0,
        }
    }

    /// Deterministic successor state
    pub fn next_state(&self) -> usize {
        (self.state + 1) % STATES
    }

    pub fn summary(&self) -> StateSummary {
        StateSummary {
            metrics: self.metrics,
            topology: self.topology,
            state: self.state,
            episode: self.episode,
        }
    }
}

/// Serializable view of the state without the table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub metrics: MetricSnapshot,
    pub topology: TopologyTag,
    pub state: usize,
    pub episode: u32,
}
