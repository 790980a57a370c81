//! Fixed-budget local search over the channel-check interval
//!
//! Each generation perturbs the search centre, scores every candidate on a
//! hypothetical snapshot derived by the proportional model, and greedily
//! keeps the best. The elite fitness never increases. An occasional escape
//! mutation moves the centre without touching the elite.

use meshtune_common::{Elasticity, MetricSnapshot, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::population::{symmetric_offset, IntervalBounds, Population};
use crate::config::GaSettings;
use crate::fitness::FitnessCalculator;

/// Search parameters
#[derive(Debug, Clone)]
pub struct GaParams {
    pub population_size: usize,
    pub generations: u32,
    pub mutation_rate: f64,
    pub perturbation_ms: f64,
    pub mutation_step_ms: f64,
    pub bounds: IntervalBounds,
    pub elasticity: Elasticity,
}

impl From<&GaSettings> for GaParams {
    fn from(s: &GaSettings) -> Self {
        Self {
            population_size: s.population_size,
            generations: s.generations,
            mutation_rate: s.mutation_rate.clamp(0.0, 1.0),
            perturbation_ms: s.perturbation_ms,
            mutation_step_ms: s.mutation_step_ms,
            bounds: IntervalBounds::new(s.min_interval_ms, s.max_interval_ms),
            elasticity: s.elasticity,
        }
    }
}

impl Default for GaParams {
    fn default() -> Self {
        Self::from(&GaSettings::default())
    }
}

/// A scored interval with the snapshot it was scored on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Elite {
    pub interval_ms: f64,
    pub metrics: MetricSnapshot,
    pub fitness: f64,
}

/// Summary of one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// 1-based generation index
    pub generation: u32,
    pub best_interval_ms: f64,
    pub best_fitness: f64,
    /// Centre the next generation will explore around
    pub centre_interval_ms: f64,
    /// Candidates adopted as the new elite during the scan
    pub improvements: usize,
    /// Candidates dropped for a non-finite score
    pub rejected: usize,
    pub mutated: bool,
}

/// Final result handed to the driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaOutcome {
    pub best_interval_ms: f64,
    pub best_fitness: f64,
    pub best_metrics: MetricSnapshot,
    pub initial_interval_ms: f64,
    pub initial_fitness: f64,
    pub generations: u32,
    pub mutations: u32,
    /// Elite fitness after each generation
    pub history: Vec<f64>,
}

pub struct GeneticOptimizer {
    params: GaParams,
    calculator: FitnessCalculator,
    elite: Elite,
    centre: Elite,
    initial: Elite,
    generation: u32,
    mutations: u32,
    history: Vec<f64>,
}

impl GeneticOptimizer {
    /// Start a search from `interval_ms` observed with `metrics`
    ///
    /// Fails with a numeric error when the starting point cannot be scored.
    pub fn new(
        params: GaParams,
        calculator: FitnessCalculator,
        interval_ms: f64,
        metrics: MetricSnapshot,
    ) -> Result<Self> {
        let fitness = calculator.checked_score(&metrics)?;
        let start = Elite {
            interval_ms: params.bounds.clamp(interval_ms),
            metrics,
            fitness,
        };
        Ok(Self {
            history: Vec::with_capacity(params.generations as usize),
            params,
            calculator,
            elite: start,
            centre: start,
            initial: start,
            generation: 0,
            mutations: 0,
        })
    }

    pub fn best(&self) -> &Elite {
        &self.elite
    }

    pub fn centre(&self) -> &Elite {
        &self.centre
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.generation >= self.params.generations
    }

    /// Hypothetical snapshot for `candidate_ms` relative to `anchor`
    fn project(&self, anchor: &Elite, candidate_ms: f64) -> MetricSnapshot {
        let fraction = (candidate_ms - anchor.interval_ms) / anchor.interval_ms;
        anchor.metrics.scaled(fraction, &self.params.elasticity)
    }

    /// Run one generation; `None` once the budget is spent
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<GenerationReport> {
        if self.is_finished() {
            return None;
        }

        let anchor = self.centre;
        let population = Population::around(
            rng,
            anchor.interval_ms,
            self.params.population_size,
            self.params.perturbation_ms,
            self.params.bounds,
        );

        let mut improvements = 0;
        let mut rejected = 0;
        for &candidate in population.candidates() {
            let metrics = self.project(&anchor, candidate);
            let fitness = self.calculator.score(&metrics);
            if !fitness.is_finite() {
                trace!(candidate, "Rejected candidate with non-finite fitness");
                rejected += 1;
                continue;
            }
            if fitness < self.elite.fitness {
                self.elite = Elite {
                    interval_ms: candidate,
                    metrics,
                    fitness,
                };
                self.centre = self.elite;
                improvements += 1;
            }
        }

        let mutated = self.params.mutation_rate > 0.0 && rng.gen_bool(self.params.mutation_rate);
        if mutated {
            self.mutate(rng);
        }

        self.generation += 1;
        self.history.push(self.elite.fitness);

        debug!(
            generation = self.generation,
            best_interval_ms = self.elite.interval_ms,
            best_fitness = self.elite.fitness,
            improvements,
            mutated,
            "Generation complete"
        );

        Some(GenerationReport {
            generation: self.generation,
            best_interval_ms: self.elite.interval_ms,
            best_fitness: self.elite.fitness,
            centre_interval_ms: self.centre.interval_ms,
            improvements,
            rejected,
            mutated,
        })
    }

    /// Escape mutation: shift the centre around the elite
    fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let shifted = self
            .params
            .bounds
            .clamp(self.elite.interval_ms + symmetric_offset(rng, self.params.mutation_step_ms));
        let metrics = self.project(&self.elite, shifted);
        let fitness = self.calculator.score(&metrics);
        if !fitness.is_finite() {
            return;
        }

        self.centre = Elite {
            interval_ms: shifted,
            metrics,
            fitness,
        };
        if fitness < self.elite.fitness {
            self.elite = self.centre;
        }
        self.mutations += 1;
    }

    /// Run the remaining generations synchronously
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> GaOutcome {
        while self.step(rng).is_some() {}
        self.finish()
    }

    pub fn finish(self) -> GaOutcome {
        GaOutcome {
            best_interval_ms: self.elite.interval_ms,
            best_fitness: self.elite.fitness,
            best_metrics: self.elite.metrics,
            initial_interval_ms: self.initial.interval_ms,
            initial_fitness: self.initial.fitness,
            generations: self.generation,
            mutations: self.mutations,
            history: self.history,
        }
    }
}
