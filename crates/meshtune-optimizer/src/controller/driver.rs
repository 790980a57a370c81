//! Phase sequencer
//!
//! Owns every piece of mutable optimizer state (live snapshot, Q-table,
//! counters, topology, RNG) and drives it through the fixed phase sequence.
//! A single task runs the whole thing; suspension happens only at the warmup
//! wait, the episode waits, the CONFIGURE retry delay and the yields between
//! search generations. The shutdown signal is checked at each of those.

use std::time::Duration;

use chrono::{DateTime, Utc};
use meshtune_common::{ConfigurationError, MeshtuneError, Result, TimerFailure};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::phase::Phase;
use crate::config::MeshtuneConfig;
use crate::fitness::FitnessCalculator;
use crate::genetic::{GaOutcome, GaParams, GeneticOptimizer};
use crate::interface::{interval_from_ms, RoutingProtocol, TimerService};
use crate::learning::{RlAdapter, RlParams, SimulationState, StateSummary};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Extra wait granted to a timer beyond `armed × grace_factor`
const TIMER_SLACK: Duration = Duration::from_millis(50);

/// Result of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub baseline_interval_ms: f64,
    /// Interval in effect when the run ended
    pub applied_interval_ms: f64,
    /// Whether the search result reached the routing layer
    pub configured: bool,
    pub ga: Option<GaOutcome>,
    /// Value every Q entry was seeded with
    pub q_seed: Option<f64>,
    pub episodes: u32,
    pub final_state: StateSummary,
    /// Reason the run fell back to the last known-good interval
    pub aborted: Option<String>,
}

pub struct Driver<P, T> {
    config: MeshtuneConfig,
    routing: P,
    timer: T,
    telemetry: Box<dyn TelemetrySink>,
    rng: StdRng,
    calculator: FitnessCalculator,
    sim: SimulationState,
    phase: Phase,
    started: bool,
    /// Last interval the routing layer accepted (ms)
    known_good_ms: Option<f64>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<P: RoutingProtocol, T: TimerService> Driver<P, T> {
    pub fn new(
        config: MeshtuneConfig,
        routing: P,
        timer: T,
        telemetry: impl TelemetrySink + 'static,
    ) -> Self {
        let rng = match config.driver.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let calculator = FitnessCalculator::new(config.weights);
        let sim = SimulationState::new(config.initial);
        Self {
            config,
            routing,
            timer,
            telemetry: Box::new(telemetry),
            rng,
            calculator,
            sim,
            phase: Phase::Init,
            started: false,
            known_good_ms: None,
            shutdown: None,
        }
    }

    /// Abort at the next suspension point once `true` is sent
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &SimulationState {
        &self.sim
    }

    pub fn routing(&self) -> &P {
        &self.routing
    }

    pub fn known_good_interval_ms(&self) -> Option<f64> {
        self.known_good_ms
    }

    /// Run every phase once
    ///
    /// The driver ends in `DONE` whatever the outcome and cannot be run again.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<RunReport> {
        if self.started {
            return Err(MeshtuneError::Internal("driver already ran".to_string()));
        }
        self.started = true;

        let mut report = RunReport {
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            baseline_interval_ms: self.config.driver.baseline_interval_ms,
            applied_interval_ms: self.config.driver.baseline_interval_ms,
            configured: false,
            ga: None,
            q_seed: None,
            episodes: 0,
            final_state: self.sim.summary(),
            aborted: None,
        };
        info!(run_id = %report.run_id, "Starting RPL GA-RL optimization");

        let outcome = self.execute(&mut report).await;
        self.timer.disarm();
        self.enter(Phase::Done);

        report.finished_at = Utc::now();
        report.final_state = self.sim.summary();
        report.episodes = self.sim.episode;
        if let Some(ms) = self.known_good_ms {
            report.applied_interval_ms = ms;
        }

        match outcome {
            Ok(()) => {
                info!(
                    applied_interval_ms = report.applied_interval_ms,
                    episodes = report.episodes,
                    "Optimization finished"
                );
                Ok(report)
            }
            Err(e) => {
                self.emit(TelemetryEvent::error(format!("Optimization failed: {e}")));
                Err(e)
            }
        }
    }

    async fn execute(&mut self, report: &mut RunReport) -> Result<()> {
        // INIT
        self.emit(TelemetryEvent::PhaseEntered { phase: Phase::Init });
        self.routing.initialize().await?;
        let baseline = self.config.driver.baseline_interval_ms;
        self.routing
            .set_channel_check_interval(interval_from_ms(baseline))
            .await?;
        self.known_good_ms = Some(baseline);

        // WARMUP
        self.enter(Phase::Warmup);
        self.wait_for_timer(self.config.driver.warmup(), "warmup")
            .await?;

        // GA_PHASE
        self.enter(Phase::GaPhase);
        let ga = match self.run_search(baseline).await {
            Ok(ga) => ga,
            Err(e @ MeshtuneError::Numeric(_)) => return self.fall_back(report, e).await,
            Err(e) => return Err(e),
        };
        let best_ms = ga.best_interval_ms;
        let best_fitness = ga.best_fitness;
        report.ga = Some(ga);

        // CONFIGURE
        self.enter(Phase::Configure);
        report.configured = self.configure(best_ms, best_fitness).await?;

        // RL_INIT
        self.enter(Phase::RlInit);
        let adapter = RlAdapter::new(RlParams::from(&self.config.rl), self.calculator);
        match adapter.seed_table(&mut self.sim) {
            Ok(seed) => report.q_seed = Some(seed),
            Err(e) => return self.fall_back(report, e).await,
        }

        // RL_LOOP
        self.enter(Phase::RlLoop);
        let episode_duration = self.config.rl.episode_duration();
        for _ in 0..self.config.rl.episodes {
            self.wait_for_timer(episode_duration, "episode").await?;
            match adapter.step(&mut self.sim, &mut self.rng) {
                Ok(episode) => {
                    let interval_ms = self.known_good_ms.unwrap_or(baseline);
                    self.emit(TelemetryEvent::Episode {
                        interval_ms,
                        report: episode,
                    });
                }
                Err(e) => return self.fall_back(report, e).await,
            }
        }

        Ok(())
    }

    /// Search generations, yielding to the scheduler between them
    async fn run_search(&mut self, start_ms: f64) -> Result<GaOutcome> {
        let settings = &self.config.ga;
        let report_every = settings.report_every.max(1);
        let yield_every = settings.yield_every;
        let mut optimizer = GeneticOptimizer::new(
            GaParams::from(settings),
            self.calculator,
            start_ms,
            self.sim.metrics,
        )?;
        info!(
            initial_fitness = optimizer.best().fitness,
            generations = settings.generations,
            "Search started"
        );

        while let Some(generation) = optimizer.step(&mut self.rng) {
            let last = optimizer.is_finished();
            if generation.generation % report_every == 0 || last {
                self.emit(TelemetryEvent::Generation(generation.clone()));
            }
            if !last && yield_every > 0 && generation.generation % yield_every == 0 {
                self.check_cancelled("search")?;
                tokio::task::yield_now().await;
            }
        }

        let outcome = optimizer.finish();
        if !outcome.best_fitness.is_finite() {
            return Err(meshtune_common::NumericDegenerate::NonFiniteFitness {
                apc: outcome.best_metrics.apc,
                pdr: outcome.best_metrics.pdr,
                latency: outcome.best_metrics.latency,
            }
            .into());
        }
        Ok(outcome)
    }

    /// Apply the search result once the routing instance is up
    ///
    /// Returns `false` when every attempt failed; the last known-good
    /// interval then stays in effect.
    async fn configure(&mut self, interval_ms: f64, fitness: f64) -> Result<bool> {
        let max_attempts = self.config.driver.configure_max_attempts.max(1);
        let delay = self.config.driver.configure_retry_delay();

        for attempt in 1..=max_attempts {
            match self.routing.instance() {
                Some(instance) => {
                    match self
                        .routing
                        .set_channel_check_interval(interval_from_ms(interval_ms))
                        .await
                    {
                        Ok(()) => {
                            self.known_good_ms = Some(interval_ms);
                            info!(
                                instance_id = instance.instance_id,
                                interval_ms, "Applied optimized channel check interval"
                            );
                            self.emit(TelemetryEvent::Configured {
                                interval_ms,
                                fitness,
                            });
                            return Ok(true);
                        }
                        Err(e) => {
                            self.emit(TelemetryEvent::warn(format!(
                                "Attempt {attempt} of {max_attempts}: {e}"
                            )));
                        }
                    }
                }
                None => {
                    let err = ConfigurationError::InstanceUnavailable {
                        attempt,
                        max_attempts,
                    };
                    self.emit(TelemetryEvent::warn(err.to_string()));
                }
            }

            if attempt < max_attempts {
                self.sleep_or_cancel(delay, "configure").await?;
            }
        }

        self.emit(TelemetryEvent::error(format!(
            "Routing never accepted {interval_ms:.3}ms; keeping {:.3}ms",
            self.known_good_ms.unwrap_or(self.config.driver.baseline_interval_ms)
        )));
        Ok(false)
    }

    /// Re-apply the last known-good interval and end the run early
    async fn fall_back(&mut self, report: &mut RunReport, cause: MeshtuneError) -> Result<()> {
        let known_good = self
            .known_good_ms
            .unwrap_or(self.config.driver.baseline_interval_ms);
        warn!(%cause, known_good, "Aborting optimization, falling back");
        self.emit(TelemetryEvent::error(format!(
            "{cause}; falling back to {known_good:.3}ms"
        )));
        self.routing
            .set_channel_check_interval(interval_from_ms(known_good))
            .await?;
        self.known_good_ms = Some(known_good);
        report.aborted = Some(cause.to_string());
        Ok(())
    }

    /// Arm the timer and suspend until it fires
    ///
    /// A wait longer than `duration × grace_factor` re-arms the timer; after
    /// `timer_max_retries` re-arms the failure is fatal.
    async fn wait_for_timer(&mut self, duration: Duration, label: &str) -> Result<()> {
        let grace = self.config.driver.timer_grace_factor.max(1.0);
        let bound = duration.mul_f64(grace).max(duration + TIMER_SLACK);
        let attempts = self.config.driver.timer_max_retries + 1;

        for attempt in 1..=attempts {
            self.check_cancelled(label)?;
            self.timer.arm(duration);
            if !self.timer.is_armed() {
                return Err(TimerFailure::NotArmed.into());
            }

            let fired = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => None,
                r = tokio::time::timeout(bound, self.timer.expired()) => Some(r.is_ok()),
            };

            match fired {
                Some(true) => return Ok(()),
                Some(false) => {
                    self.timer.disarm();
                    self.emit(TelemetryEvent::warn(format!(
                        "{label} timer did not fire within {}ms (attempt {attempt} of {attempts})",
                        bound.as_millis()
                    )));
                }
                None => {
                    self.timer.disarm();
                    return Err(self.cancelled(label));
                }
            }
        }

        Err(TimerFailure::NeverFired {
            armed_ms: duration.as_millis() as u64,
            waited_ms: (bound.as_millis() as u64).saturating_mul(attempts as u64),
            attempts,
        }
        .into())
    }

    async fn sleep_or_cancel(&mut self, delay: Duration, label: &str) -> Result<()> {
        self.check_cancelled(label)?;
        let slept = tokio::select! {
            biased;
            _ = shutdown_requested(&mut self.shutdown) => false,
            _ = tokio::time::sleep(delay) => true,
        };
        if slept {
            Ok(())
        } else {
            Err(self.cancelled(label))
        }
    }

    fn check_cancelled(&mut self, label: &str) -> Result<()> {
        let requested = self
            .shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false);
        if requested {
            Err(self.cancelled(label))
        } else {
            Ok(())
        }
    }

    fn cancelled(&mut self, label: &str) -> MeshtuneError {
        self.emit(TelemetryEvent::warn(format!(
            "Shutdown requested during {label}"
        )));
        MeshtuneError::Cancelled(label.to_string())
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(
            self.phase.can_enter(phase),
            "illegal transition {} -> {}",
            self.phase,
            phase
        );
        if !self.phase.can_enter(phase) {
            return;
        }
        self.phase = phase;
        self.emit(TelemetryEvent::PhaseEntered { phase });
    }

    fn emit(&mut self, event: TelemetryEvent) {
        self.telemetry.record(&event);
    }
}

/// Resolves once `true` is observed on the shutdown channel
///
/// Pending forever when no channel is attached or every sender is gone.
async fn shutdown_requested(shutdown: &mut Option<watch::Receiver<bool>>) {
    let Some(rx) = shutdown else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}
