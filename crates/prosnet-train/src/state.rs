//! Learning-rate schedule and progress counter shared by the workers.
//!
//! The learning rate decays linearly with the number of processed edges:
//!
//! ```text
//! alpha = starting_alpha * (1 - edge_count_actual / (samples * iters + 1))
//! ```
//!
//! floored at `starting_alpha * 1e-4`. Workers publish progress every ~1000
//! edges. The update is a relaxed read followed by a relaxed write, so two
//! workers may race; the stored value only ever moves down.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Fraction of the starting learning rate below which alpha never falls.
pub const MIN_ALPHA_FRACTION: f32 = 1e-4;

/// Shared annealing state for one run.
#[derive(Debug)]
pub struct TrainingState {
    starting_alpha: f32,
    /// `f32` bit pattern.
    alpha: AtomicU32,
    edge_count_actual: AtomicU64,
    total_budget: u64,
}

impl TrainingState {
    pub fn new(starting_alpha: f32, samples: u64, iters: usize) -> Self {
        Self {
            starting_alpha,
            alpha: AtomicU32::new(starting_alpha.to_bits()),
            edge_count_actual: AtomicU64::new(0),
            total_budget: samples.saturating_mul(iters as u64),
        }
    }

    pub fn starting_alpha(&self) -> f32 {
        self.starting_alpha
    }

    pub fn min_alpha(&self) -> f32 {
        self.starting_alpha * MIN_ALPHA_FRACTION
    }

    /// Current learning rate.
    #[inline]
    pub fn alpha(&self) -> f32 {
        f32::from_bits(self.alpha.load(Ordering::Relaxed))
    }

    pub fn edge_count_actual(&self) -> u64 {
        self.edge_count_actual.load(Ordering::Relaxed)
    }

    pub fn total_budget(&self) -> u64 {
        self.total_budget
    }

    /// Fraction of the planned budget processed so far, in percent.
    pub fn progress_percent(&self) -> f64 {
        self.edge_count_actual() as f64 / (self.total_budget as f64 + 1.0) * 100.0
    }

    /// Reset the progress counter. Called by the scheduler between segments.
    pub fn rewind(&self, edge_count_actual: u64) {
        self.edge_count_actual
            .store(edge_count_actual, Ordering::Relaxed);
    }

    /// Add `delta` processed edges and re-anneal. Returns the new alpha.
    pub fn record_progress(&self, delta: u64) -> f32 {
        let actual = self.edge_count_actual.fetch_add(delta, Ordering::Relaxed) + delta;
        let scheduled = self.scheduled_alpha(actual);
        let current = self.alpha();
        if scheduled < current {
            self.alpha.store(scheduled.to_bits(), Ordering::Relaxed);
            scheduled
        } else {
            current
        }
    }

    /// Alpha prescribed for a given processed-edge count.
    pub fn scheduled_alpha(&self, edge_count_actual: u64) -> f32 {
        let fraction = edge_count_actual as f64 / (self.total_budget as f64 + 1.0);
        let alpha = self.starting_alpha * (1.0 - fraction) as f32;
        alpha.max(self.min_alpha())
    }
}
