//! Candidate interval population
//!
//! Regenerated each generation around the search centre and discarded after
//! the scan.

use rand::Rng;

/// Closed range a candidate interval is clamped to (ms)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalBounds {
    pub min_ms: f64,
    pub max_ms: f64,
}

impl IntervalBounds {
    pub fn new(min_ms: f64, max_ms: f64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn clamp(&self, interval_ms: f64) -> f64 {
        interval_ms.clamp(self.min_ms, self.max_ms)
    }

    pub fn contains(&self, interval_ms: f64) -> bool {
        (self.min_ms..=self.max_ms).contains(&interval_ms)
    }
}

/// Uniform symmetric offset in `[-half_width, half_width]`
pub fn symmetric_offset<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    if !(half_width.is_finite() && half_width > 0.0) {
        return 0.0;
    }
    rng.gen_range(-half_width..=half_width)
}

/// One generation's candidates
#[derive(Debug, Clone)]
pub struct Population {
    candidates: Vec<f64>,
}

impl Population {
    /// Perturb `centre` `size` times, clamping each candidate to `bounds`
    pub fn around<R: Rng + ?Sized>(
        rng: &mut R,
        centre: f64,
        size: usize,
        half_width: f64,
        bounds: IntervalBounds,
    ) -> Self {
        let candidates = (0..size)
            .map(|_| bounds.clamp(centre + symmetric_offset(rng, half_width)))
            .collect();
        Self { candidates }
    }

    pub fn candidates(&self) -> &[f64] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
