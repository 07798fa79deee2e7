//! Alias tables for O(1) categorical draws.
//!
//! Both positive-edge sampling and negative sampling draw millions of times
//! from fixed discrete distributions, so each distribution is compiled once
//! into a Walker/Vose alias table: `n` buckets, each holding a threshold and
//! an alias. A draw picks a bucket uniformly and flips one biased coin.
//!
//! References:
//! - Walker (1974): An efficient method for generating discrete random variables with general distributions.
//! - Vose (1991): A linear algorithm for generating random numbers with a given distribution.

use crate::error::{Error, Result};
use rand::Rng;

/// A discrete distribution compiled for O(1) sampling.
#[derive(Debug, Clone)]
pub struct AliasTable {
    /// Acceptance threshold per bucket.
    prob: Vec<f32>,
    /// Fallback index per bucket.
    alias: Vec<u32>,
}

impl AliasTable {
    /// Build a table from non-negative weights (not necessarily normalized).
    ///
    /// Entries with weight `0.0` are never drawn.
    pub fn new(weights: &[f64]) -> Result<Self> {
        let n = weights.len();
        if n == 0 {
            return Err(Error::InvalidWeights("empty weight vector".into()));
        }
        if n > u32::MAX as usize {
            return Err(Error::InvalidWeights(format!("{n} entries exceed table capacity")));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidWeights(format!("weight {w} is negative or not finite")));
        }
        let total: f64 = weights.iter().sum();
        if !(total > 0.0) {
            return Err(Error::InvalidWeights("total weight is zero".into()));
        }

        let mut scaled: Vec<f64> = weights.iter().map(|&w| w * n as f64 / total).collect();
        let mut alias = vec![0u32; n];
        let mut smaller: Vec<usize> = Vec::with_capacity(n);
        let mut larger: Vec<usize> = Vec::with_capacity(n);

        for (i, &q) in scaled.iter().enumerate() {
            if q < 1.0 {
                smaller.push(i);
            } else {
                larger.push(i);
            }
        }

        while let (Some(small), Some(large)) = (smaller.pop(), larger.pop()) {
            alias[small] = large as u32;
            scaled[large] = scaled[large] + scaled[small] - 1.0;
            if scaled[large] < 1.0 {
                smaller.push(large);
            } else {
                larger.push(large);
            }
        }

        // Leftovers are only off by rounding error.
        for i in smaller.into_iter().chain(larger) {
            scaled[i] = 1.0;
        }

        // A zero-weight bucket left over by rounding must still never accept itself.
        let fallback = weights.iter().position(|&w| w > 0.0).unwrap_or(0) as u32;
        for (i, &w) in weights.iter().enumerate() {
            if w == 0.0 {
                scaled[i] = 0.0;
                if weights[alias[i] as usize] == 0.0 {
                    alias[i] = fallback;
                }
            }
        }

        Ok(Self {
            prob: scaled.into_iter().map(|q| q as f32).collect(),
            alias,
        })
    }

    /// Uniform distribution over `n` outcomes.
    pub fn uniform(n: usize) -> Result<Self> {
        Self::new(&vec![1.0; n])
    }

    /// Number of outcomes.
    pub fn len(&self) -> usize {
        self.prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draw one outcome.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let k = rng.random_range(0..self.prob.len());
        if rng.random::<f32>() < self.prob[k] {
            k
        } else {
            self.alias[k] as usize
        }
    }
}
