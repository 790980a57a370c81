//! MetricSnapshot - the three performance dimensions the controller reacts to
//!
//! - APC: average power consumption (mW)
//! - PDR: packet delivery ratio
//! - Latency: end-to-end delay (ms)
//!
//! The snapshot carries no bounds of its own. PDR in particular may drift to
//! zero or below under the synthetic per-episode rule; consumers that take a
//! reciprocal go through [`MetricSnapshot::effective_pdr`].

use serde::{Deserialize, Serialize};

use crate::PDR_FLOOR;

/// Initial APC of a freshly booted node (mW)
pub const INITIAL_APC: f64 = 0.6;

/// Initial PDR of a freshly booted node
pub const INITIAL_PDR: f64 = 0.85;

/// Initial end-to-end latency of a freshly booted node (ms)
pub const INITIAL_LATENCY: f64 = 200.0;

/// Current APC / PDR / latency values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Average power consumption (mW)
    pub apc: f64,
    /// Packet delivery ratio
    pub pdr: f64,
    /// End-to-end latency (ms)
    pub latency: f64,
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self::new(INITIAL_APC, INITIAL_PDR, INITIAL_LATENCY)
    }
}

impl MetricSnapshot {
    pub fn new(apc: f64, pdr: f64, latency: f64) -> Self {
        Self { apc, pdr, latency }
    }

    /// PDR clamped to the positive floor, safe to invert
    #[inline]
    pub fn effective_pdr(&self) -> f64 {
        if self.pdr.is_nan() {
            return PDR_FLOOR;
        }
        self.pdr.max(PDR_FLOOR)
    }

    /// True when every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.apc.is_finite() && self.pdr.is_finite() && self.latency.is_finite()
    }

    /// Apply one synthetic step in place
    pub fn apply(&mut self, delta: &MetricDelta) {
        self.apc -= delta.apc_decrement;
        self.latency -= delta.latency_decrement;
        self.pdr += delta.pdr_increment;
    }

    /// Scale by a fractional parameter change
    ///
    /// APC and latency follow the change, PDR moves against it. Elasticities
    /// weight each dimension's sensitivity.
    pub fn scaled(&self, fraction: f64, elasticity: &Elasticity) -> Self {
        Self {
            apc: self.apc * (1.0 + elasticity.apc * fraction),
            pdr: self.pdr * (1.0 - elasticity.pdr * fraction),
            latency: self.latency * (1.0 + elasticity.latency * fraction),
        }
    }
}

impl std::fmt::Display for MetricSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "APC {:.2}, Latency {:.2}, PDR {:.2}",
            self.apc, self.latency, self.pdr
        )
    }
}

/// Fixed per-episode synthetic change
///
/// APC and latency go down by their decrements, PDR goes up by its increment.
/// Negative values reverse the direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub apc_decrement: f64,
    pub latency_decrement: f64,
    pub pdr_increment: f64,
}

impl Default for MetricDelta {
    fn default() -> Self {
        Self {
            apc_decrement: 0.005,
            latency_decrement: 2.0,
            pdr_increment: 0.005,
        }
    }
}

/// Sensitivity of each metric to a fractional parameter change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Elasticity {
    pub apc: f64,
    pub pdr: f64,
    pub latency: f64,
}

impl Default for Elasticity {
    fn default() -> Self {
        Self {
            apc: 1.0,
            pdr: 1.0,
            latency: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let snapshot = MetricSnapshot::default();
        assert_eq!(snapshot.apc, 0.6);
        assert_eq!(snapshot.pdr, 0.85);
        assert_eq!(snapshot.latency, 200.0);
    }

    #[test]
    fn test_effective_pdr_clamps() {
        assert_eq!(MetricSnapshot::new(0.6, 0.0, 200.0).effective_pdr(), PDR_FLOOR);
        assert_eq!(MetricSnapshot::new(0.6, -0.4, 200.0).effective_pdr(), PDR_FLOOR);
        assert_eq!(MetricSnapshot::new(0.6, f64::NAN, 200.0).effective_pdr(), PDR_FLOOR);
        assert_eq!(MetricSnapshot::new(0.6, 0.5, 200.0).effective_pdr(), 0.5);
    }

    #[test]
    fn test_apply_delta() {
        let mut snapshot = MetricSnapshot::new(1.0, 0.5, 100.0);
        let delta = MetricDelta {
            apc_decrement: 0.25,
            latency_decrement: 10.0,
            pdr_increment: 0.125,
        };
        snapshot.apply(&delta);
        assert_eq!(snapshot, MetricSnapshot::new(0.75, 0.625, 90.0));
    }

    #[test]
    fn test_scaled_moves_pdr_against_change() {
        let snapshot = MetricSnapshot::new(1.0, 0.8, 100.0);
        let scaled = snapshot.scaled(0.5, &Elasticity::default());
        assert_eq!(scaled.apc, 1.5);
        assert_eq!(scaled.latency, 150.0);
        assert!((scaled.pdr - 0.4).abs() < 1e-12);

        let unchanged = snapshot.scaled(0.0, &Elasticity::default());
        assert_eq!(unchanged, snapshot);
    }

    #[test]
    fn test_display() {
        let text = MetricSnapshot::default().to_string();
        assert_eq!(text, "APC 0.60, Latency 200.00, PDR 0.85");
    }
}
