//! # Meshtune Common
//!
//! Shared types, constants, and errors for the meshtune radio duty-cycle
//! controller.
//!
//! ## Core Types
//!
//! - [`MetricSnapshot`]: APC / PDR / latency triple observed (or synthesized) on the node
//! - [`TopologyTag`]: cyclic topology label advanced once per learning episode
//!
//! ## Errors
//!
//! - [`MeshtuneError`]: unified error type with the configuration, timer and
//!   numeric sub-taxonomies

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigurationError, MeshtuneError, NumericDegenerate, Result, TimerFailure};
pub use types::{
    metrics::{Elasticity, MetricDelta, MetricSnapshot},
    topology::TopologyTag,
};

/// Meshtune version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Candidates evaluated per generation
pub const POP_SIZE: usize = 100;

/// Fixed generation budget of the search phase
pub const GENERATIONS: u32 = 50;

/// Probability of the post-scan escape mutation
pub const MUTATION_RATE: f64 = 0.1;

/// Q-learning step size (α)
pub const LEARNING_RATE: f64 = 0.1;

/// Q-learning discount factor (γ)
pub const DISCOUNT_FACTOR: f64 = 0.9;

/// Learning episodes per run
pub const EPISODES: u32 = 10;

/// Discrete learning states
pub const STATES: usize = 50;

/// Discrete learning actions
pub const ACTIONS: usize = 10;

/// Smallest PDR fed into a reciprocal
pub const PDR_FLOOR: f64 = 1e-3;

/// Baseline channel-check interval in milliseconds (8 Hz)
pub const BASELINE_CHECK_INTERVAL_MS: f64 = 125.0;

/// Episode tick in milliseconds
pub const EPISODE_MS: u64 = 250;

/// Topology settling time before optimization starts, in milliseconds
pub const WARMUP_MS: u64 = 60_000;
