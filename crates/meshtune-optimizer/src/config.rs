//! Meshtune configuration

use std::str::FromStr;
use std::time::Duration;

use meshtune_common::{
    Elasticity, MeshtuneError, MetricDelta, MetricSnapshot, Result, BASELINE_CHECK_INTERVAL_MS,
    DISCOUNT_FACTOR, EPISODES, EPISODE_MS, GENERATIONS, LEARNING_RATE, MUTATION_RATE, POP_SIZE,
    WARMUP_MS,
};
use serde::{Deserialize, Serialize};

use crate::fitness::FitnessWeights;

/// Top-level controller configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshtuneConfig {
    /// Search phase settings
    pub ga: GaSettings,
    /// Learning phase settings
    pub rl: RlSettings,
    /// Phase sequencing settings
    pub driver: DriverSettings,
    /// Fitness term weights
    pub weights: FitnessWeights,
    /// Metrics the run starts from
    pub initial: MetricSnapshot,
}

impl MeshtuneConfig {
    /// Load configuration from `.env` and `MESHTUNE_*` variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        override_from_env("MESHTUNE_GA_POPULATION_SIZE", &mut cfg.ga.population_size);
        override_from_env("MESHTUNE_GA_GENERATIONS", &mut cfg.ga.generations);
        override_from_env("MESHTUNE_GA_MUTATION_RATE", &mut cfg.ga.mutation_rate);
        override_from_env("MESHTUNE_GA_PERTURBATION_MS", &mut cfg.ga.perturbation_ms);
        override_from_env("MESHTUNE_GA_MUTATION_STEP_MS", &mut cfg.ga.mutation_step_ms);
        override_from_env("MESHTUNE_GA_MIN_INTERVAL_MS", &mut cfg.ga.min_interval_ms);
        override_from_env("MESHTUNE_GA_MAX_INTERVAL_MS", &mut cfg.ga.max_interval_ms);
        override_from_env("MESHTUNE_GA_REPORT_EVERY", &mut cfg.ga.report_every);
        override_from_env("MESHTUNE_GA_YIELD_EVERY", &mut cfg.ga.yield_every);

        override_from_env("MESHTUNE_RL_LEARNING_RATE", &mut cfg.rl.learning_rate);
        override_from_env("MESHTUNE_RL_DISCOUNT_FACTOR", &mut cfg.rl.discount_factor);
        override_from_env("MESHTUNE_RL_EPISODES", &mut cfg.rl.episodes);
        override_from_env("MESHTUNE_RL_EPISODE_MS", &mut cfg.rl.episode_ms);
        override_from_env("MESHTUNE_RL_APC_STEP", &mut cfg.rl.delta.apc_decrement);
        override_from_env("MESHTUNE_RL_LATENCY_STEP", &mut cfg.rl.delta.latency_decrement);
        override_from_env("MESHTUNE_RL_PDR_STEP", &mut cfg.rl.delta.pdr_increment);

        override_from_env("MESHTUNE_WARMUP_MS", &mut cfg.driver.warmup_ms);
        override_from_env("MESHTUNE_BASELINE_INTERVAL_MS", &mut cfg.driver.baseline_interval_ms);
        override_from_env(
            "MESHTUNE_CONFIGURE_RETRY_DELAY_MS",
            &mut cfg.driver.configure_retry_delay_ms,
        );
        override_from_env(
            "MESHTUNE_CONFIGURE_MAX_ATTEMPTS",
            &mut cfg.driver.configure_max_attempts,
        );
        override_from_env("MESHTUNE_TIMER_GRACE_FACTOR", &mut cfg.driver.timer_grace_factor);
        override_from_env("MESHTUNE_TIMER_MAX_RETRIES", &mut cfg.driver.timer_max_retries);
        if let Ok(seed) = std::env::var("MESHTUNE_SEED") {
            if let Ok(v) = seed.parse() {
                cfg.driver.seed = Some(v);
            }
        }

        override_from_env("MESHTUNE_INITIAL_APC", &mut cfg.initial.apc);
        override_from_env("MESHTUNE_INITIAL_PDR", &mut cfg.initial.pdr);
        override_from_env("MESHTUNE_INITIAL_LATENCY", &mut cfg.initial.latency);

        Ok(cfg)
    }

    /// Reject settings the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        let ga = &self.ga;
        if ga.population_size == 0 {
            return Err(invalid("ga.population_size must be positive"));
        }
        if ga.generations == 0 {
            return Err(invalid("ga.generations must be positive"));
        }
        if !(0.0..=1.0).contains(&ga.mutation_rate) {
            return Err(invalid("ga.mutation_rate must lie in [0, 1]"));
        }
        if !(ga.min_interval_ms > 0.0
            && ga.min_interval_ms <= ga.max_interval_ms
            && ga.max_interval_ms.is_finite())
        {
            return Err(invalid("ga interval bounds must satisfy 0 < min <= max < inf"));
        }
        if !(ga.perturbation_ms >= 0.0 && ga.perturbation_ms.is_finite())
            || !(ga.mutation_step_ms >= 0.0 && ga.mutation_step_ms.is_finite())
        {
            return Err(invalid("ga perturbation widths must be finite and non-negative"));
        }

        let rl = &self.rl;
        if !(rl.learning_rate > 0.0 && rl.learning_rate <= 1.0) {
            return Err(invalid("rl.learning_rate must lie in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&rl.discount_factor) {
            return Err(invalid("rl.discount_factor must lie in [0, 1]"));
        }
        if rl.episode_ms == 0 {
            return Err(invalid("rl.episode_ms must be positive"));
        }

        let w = &self.weights;
        if ![w.apc, w.pdr, w.latency]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
        {
            return Err(invalid("fitness weights must be finite and non-negative"));
        }

        let driver = &self.driver;
        if !(driver.baseline_interval_ms > 0.0) {
            return Err(invalid("driver.baseline_interval_ms must be positive"));
        }
        if driver.baseline_interval_ms < ga.min_interval_ms
            || driver.baseline_interval_ms > ga.max_interval_ms
        {
            return Err(invalid("driver.baseline_interval_ms must lie within the ga bounds"));
        }
        if driver.configure_max_attempts == 0 {
            return Err(invalid("driver.configure_max_attempts must be positive"));
        }
        if !(driver.timer_grace_factor >= 1.0) {
            return Err(invalid("driver.timer_grace_factor must be at least 1"));
        }
        if !self.initial.is_finite() {
            return Err(invalid("initial metrics must be finite"));
        }

        Ok(())
    }
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        if let Ok(v) = val.parse() {
            *target = v;
        }
    }
}

fn invalid(msg: &str) -> MeshtuneError {
    MeshtuneError::Config(msg.to_string())
}

/// Search phase settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaSettings {
    /// Candidates per generation
    pub population_size: usize,
    /// Fixed generation budget
    pub generations: u32,
    /// Probability of the post-scan escape mutation
    pub mutation_rate: f64,
    /// Half-width of the candidate neighborhood (ms)
    pub perturbation_ms: f64,
    /// Half-width of the escape mutation (ms)
    pub mutation_step_ms: f64,
    /// Lower bound of the channel-check interval (ms)
    pub min_interval_ms: f64,
    /// Upper bound of the channel-check interval (ms)
    pub max_interval_ms: f64,
    /// Metric sensitivity to interval changes
    pub elasticity: Elasticity,
    /// Telemetry milestone period in generations
    pub report_every: u32,
    /// Scheduler yield period in generations
    pub yield_every: u32,
}

impl Default for GaSettings {
    fn default() -> Self {
        Self {
            population_size: POP_SIZE,
            generations: GENERATIONS,
            mutation_rate: MUTATION_RATE,
            perturbation_ms: 10.0,
            mutation_step_ms: 2.0,
            min_interval_ms: 15.625, // 64 Hz
            max_interval_ms: 1000.0, // 1 Hz
            elasticity: Elasticity::default(),
            report_every: 10,
            yield_every: 1,
        }
    }
}

/// Learning phase settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RlSettings {
    /// Step size (α)
    pub learning_rate: f64,
    /// Discount factor (γ)
    pub discount_factor: f64,
    /// Episodes per run
    pub episodes: u32,
    /// Episode tick (ms)
    pub episode_ms: u64,
    /// Synthetic per-episode metric change
    pub delta: MetricDelta,
}

impl Default for RlSettings {
    fn default() -> Self {
        Self {
            learning_rate: LEARNING_RATE,
            discount_factor: DISCOUNT_FACTOR,
            episodes: EPISODES,
            episode_ms: EPISODE_MS,
            delta: MetricDelta::default(),
        }
    }
}

impl RlSettings {
    pub fn episode_duration(&self) -> Duration {
        Duration::from_millis(self.episode_ms)
    }
}

/// Phase sequencing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSettings {
    /// Topology settling time before the search (ms)
    pub warmup_ms: u64,
    /// Channel-check interval applied at INIT (ms)
    pub baseline_interval_ms: f64,
    /// Delay between CONFIGURE attempts (ms)
    pub configure_retry_delay_ms: u64,
    /// CONFIGURE attempts before keeping the last known-good interval
    pub configure_max_attempts: u32,
    /// A timer is declared stuck after `armed × grace_factor`
    pub timer_grace_factor: f64,
    /// Re-arm attempts before a stuck timer is fatal
    pub timer_max_retries: u32,
    /// RNG seed, entropy when absent
    pub seed: Option<u64>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            warmup_ms: WARMUP_MS,
            baseline_interval_ms: BASELINE_CHECK_INTERVAL_MS,
            configure_retry_delay_ms: 1000,
            configure_max_attempts: 5,
            timer_grace_factor: 4.0,
            timer_max_retries: 3,
            seed: None,
        }
    }
}

impl DriverSettings {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn configure_retry_delay(&self) -> Duration {
        Duration::from_millis(self.configure_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = MeshtuneConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.ga.population_size, 100);
        assert_eq!(cfg.ga.generations, 50);
        assert_eq!(cfg.rl.episodes, 10);
        assert_eq!(cfg.rl.episode_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_bad_rates() {
        let mut cfg = MeshtuneConfig::default();
        cfg.ga.mutation_rate = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = MeshtuneConfig::default();
        cfg.rl.learning_rate = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut cfg = MeshtuneConfig::default();
        cfg.ga.min_interval_ms = 500.0;
        cfg.ga.max_interval_ms = 100.0;
        assert!(matches!(cfg.validate(), Err(MeshtuneError::Config(_))));
    }

    #[test]
    fn test_rejects_non_finite_widths() {
        for width in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut cfg = MeshtuneConfig::default();
            cfg.ga.perturbation_ms = width;
            assert!(cfg.validate().is_err(), "perturbation {width} accepted");

            let mut cfg = MeshtuneConfig::default();
            cfg.ga.mutation_step_ms = width;
            assert!(cfg.validate().is_err(), "mutation step {width} accepted");
        }
    }

    #[test]
    fn test_rejects_unbounded_interval_range() {
        let mut cfg = MeshtuneConfig::default();
        cfg.ga.max_interval_ms = f64::INFINITY;
        assert!(cfg.validate().is_err());

        let mut cfg = MeshtuneConfig::default();
        cfg.ga.min_interval_ms = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut cfg = MeshtuneConfig::default();
        cfg.weights.apc = -0.6;
        assert!(cfg.validate().is_err());

        let mut cfg = MeshtuneConfig::default();
        cfg.weights.latency = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = MeshtuneConfig::default();
        cfg.weights.pdr = f64::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_baseline_outside_bounds() {
        let mut cfg = MeshtuneConfig::default();
        cfg.driver.baseline_interval_ms = 5000.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("MESHTUNE_GA_GENERATIONS", "7");
        std::env::set_var("MESHTUNE_RL_EPISODES", "not-a-number");
        let cfg = MeshtuneConfig::load().unwrap();
        assert_eq!(cfg.ga.generations, 7);
        assert_eq!(cfg.rl.episodes, EPISODES);
        std::env::remove_var("MESHTUNE_GA_GENERATIONS");
        std::env::remove_var("MESHTUNE_RL_EPISODES");
    }

    #[test]
    fn test_serde_roundtrip_keeps_sections() {
        let cfg = MeshtuneConfig::default();
        let json = serde_json::to_value(&cfg).unwrap();
        assert!(json.get("ga").is_some());
        assert!(json.get("driver").is_some());
        assert_eq!(json["initial"]["pdr"], 0.85);
    }
}
