//! # Meshtune Optimizer
//!
//! Two-phase tuner for the RPL radio duty-cycle channel-check interval.
//!
//! ## Fitness Formula
//!
//! ```text
//! f = 0.6 × APC + 0.2 × (1 / PDR) + 0.2 × latency
//! ```
//!
//! Where:
//! - APC: average power consumption (mW)
//! - PDR: packet delivery ratio, floored before the reciprocal
//! - latency: end-to-end delay (ms)
//!
//! Lower is better.
//!
//! ## Phases
//!
//! A fixed-budget greedy search over the interval picks the value applied to
//! the routing layer. A tabular Q-learning loop then runs one episode per
//! timer tick, with reward `-(0.6 × APC + 0.2 × latency - 0.2 × PDR)` and
//! update `Q(s,a) += α(r + γ max Q(s',·) - Q(s,a))`.

pub mod config;
pub mod controller;
pub mod fitness;
pub mod genetic;
pub mod interface;
pub mod learning;
pub mod telemetry;

pub use config::MeshtuneConfig;
pub use controller::{Driver, Phase, RunReport};
pub use fitness::{fitness, FitnessCalculator, FitnessWeights};
pub use genetic::{GaOutcome, GeneticOptimizer};
pub use interface::{RoutingProtocol, SimulatedRouting, TimerService, TokioTimer};
pub use learning::{EpisodeReport, QTable, RlAdapter, SimulationState};
pub use telemetry::{
    FanoutTelemetry, PrometheusTelemetry, RecordingTelemetry, TelemetryEvent, TelemetrySink,
    TracingTelemetry,
};
