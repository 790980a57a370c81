//! Search phase module
pub mod optimizer;
pub mod population;

pub use self::optimizer::{Elite, GaOutcome, GaParams, GenerationReport, GeneticOptimizer};
pub use self::population::{IntervalBounds, Population};
