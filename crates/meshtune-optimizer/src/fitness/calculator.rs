//! Fitness calculation: f = 0.6·APC + 0.2·(1/PDR) + 0.2·latency
//!
//! Lower is better. PDR goes through the positive floor before the reciprocal
//! so a collapsed delivery ratio yields a large but finite score.

use meshtune_common::{MetricSnapshot, NumericDegenerate, Result};
use serde::{Deserialize, Serialize};

/// Weights of the three metric terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub apc: f64,
    pub pdr: f64,
    pub latency: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            apc: 0.6,
            pdr: 0.2,
            latency: 0.2,
        }
    }
}

/// Score with the default weights
pub fn fitness(apc: f64, pdr: f64, latency: f64) -> f64 {
    FitnessCalculator::default().score(&MetricSnapshot::new(apc, pdr, latency))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FitnessCalculator {
    weights: FitnessWeights,
}

impl FitnessCalculator {
    pub fn new(weights: FitnessWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Minimization objective over a snapshot
    pub fn score(&self, m: &MetricSnapshot) -> f64 {
        self.weights.apc * m.apc
            + self.weights.pdr * (1.0 / m.effective_pdr())
            + self.weights.latency * m.latency
    }

    /// Score, rejecting non-finite results
    pub fn checked_score(&self, m: &MetricSnapshot) -> Result<f64> {
        let value = self.score(m);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(NumericDegenerate::NonFiniteFitness {
                apc: m.apc,
                pdr: m.pdr,
                latency: m.latency,
            }
            .into())
        }
    }

    /// Episode reward: -(w_apc·APC + w_lat·latency - w_pdr·PDR)
    ///
    /// PDR enters linearly here, so no floor is needed.
    pub fn reward(&self, m: &MetricSnapshot) -> f64 {
        -(self.weights.apc * m.apc + self.weights.latency * m.latency - self.weights.pdr * m.pdr)
    }
}
