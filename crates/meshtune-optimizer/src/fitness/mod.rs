//! Fitness scoring module
pub mod calculator;

pub use self::calculator::{fitness, FitnessCalculator, FitnessWeights};
