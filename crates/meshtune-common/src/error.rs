//! Error types for meshtune
//!
//! Provides a unified error type and the three domain taxonomies the
//! controller distinguishes: configuration, timer and numeric failures.

use thiserror::Error;

/// Result type alias using MeshtuneError
pub type Result<T> = std::result::Result<T, MeshtuneError>;

/// Unified error type for meshtune operations
#[derive(Debug, Error)]
pub enum MeshtuneError {
    // Routing configuration errors (recoverable)
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    // Timer errors (fatal after retries)
    #[error("Timer failure: {0}")]
    Timer(#[from] TimerFailure),

    // Numeric degeneracies
    #[error("Numeric degenerate: {0}")]
    Numeric(#[from] NumericDegenerate),

    // Invalid settings
    #[error("Invalid settings: {0}")]
    Config(String),

    // Routing collaborator failure
    #[error("Routing error: {0}")]
    Routing(String),

    // Shutdown requested at a suspension point
    #[error("Run cancelled during {0}")]
    Cancelled(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeshtuneError {
    /// Whether the driver may retry the failed operation
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MeshtuneError::Configuration(_))
    }
}

/// Routing configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Routing instance not available (attempt {attempt} of {max_attempts})")]
    InstanceUnavailable { attempt: u32, max_attempts: u32 },

    #[error("Channel check interval out of range: {interval_ms}ms")]
    IntervalOutOfRange { interval_ms: f64 },
}

/// Timer errors
#[derive(Debug, Error)]
pub enum TimerFailure {
    #[error("Timer armed for {armed_ms}ms did not fire within {waited_ms}ms ({attempts} attempts)")]
    NeverFired {
        armed_ms: u64,
        waited_ms: u64,
        attempts: u32,
    },

    #[error("Timer awaited without being armed")]
    NotArmed,
}

/// Non-finite or degenerate values detected in the optimizer
#[derive(Debug, Error)]
pub enum NumericDegenerate {
    #[error("Non-finite fitness for apc={apc}, pdr={pdr}, latency={latency}")]
    NonFiniteFitness { apc: f64, pdr: f64, latency: f64 },

    #[error("Non-finite reward at episode {episode}")]
    NonFiniteReward { episode: u32 },

    #[error("Non-finite Q value at state {state}, action {action}")]
    NonFiniteQValue { state: usize, action: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshtuneError::Configuration(ConfigurationError::InstanceUnavailable {
            attempt: 2,
            max_attempts: 5,
        });
        assert!(err.to_string().contains("2 of 5"));
    }

    #[test]
    fn test_timer_failure_display() {
        let err = TimerFailure::NeverFired {
            armed_ms: 250,
            waited_ms: 1000,
            attempts: 3,
        };
        assert!(err.to_string().contains("250ms"));
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_only_configuration_is_recoverable() {
        let config: MeshtuneError = ConfigurationError::InstanceUnavailable {
            attempt: 1,
            max_attempts: 1,
        }
        .into();
        let timer: MeshtuneError = TimerFailure::NotArmed.into();
        let numeric: MeshtuneError = NumericDegenerate::NonFiniteReward { episode: 3 }.into();

        assert!(config.is_recoverable());
        assert!(!timer.is_recoverable());
        assert!(!numeric.is_recoverable());
        assert!(!MeshtuneError::Cancelled("warmup".into()).is_recoverable());
    }
}
