//! Shared embedding vectors updated HogWild-style.
//!
//! # Concurrency model
//!
//! Every worker thread reads and writes the same vectors with no locks
//! ([Recht et al. 2011](https://arxiv.org/abs/1106.5730)). Each coordinate is
//! an `f32` stored as the bit pattern of an [`AtomicU32`] and accessed with
//! `Relaxed` loads and stores only:
//!
//! - a single coordinate is never torn;
//! - an update is a plain load followed by a plain store, so two threads
//!   updating the same coordinate can lose one of the updates;
//! - no ordering is implied between coordinates or between threads.
//!
//! Lost updates are small (scaled by the learning rate) and statistically
//! independent, so they act as noise on SGD rather than as a correctness
//! problem. `Relaxed` loads and stores compile to ordinary moves on every
//! mainstream target.
//!
//! [`EmbeddingStore`] is a shared-ownership handle: cloning it shares the
//! underlying buffer.

use crate::dictionary::{NodeDictionary, NodeIndex};
use crate::error::{Error, Result};
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use rand_xorshift::XorShiftRng;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Dense vectors, one per dictionary node, shared between threads.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dictionary: Arc<NodeDictionary>,
    dim: usize,
    data: Arc<[AtomicU32]>,
}

impl EmbeddingStore {
    /// Allocate one vector per node, initialized uniformly in `[-0.5/dim, 0.5/dim)`.
    pub fn new(dictionary: Arc<NodeDictionary>, dim: usize, seed: u64) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidDimension(dim));
        }
        let bound = 0.5 / dim as f32;
        let dist = Uniform::new(-bound, bound)
            .map_err(|e| Error::Config(format!("invalid init range: {e}")))?;
        let mut rng = XorShiftRng::seed_from_u64(seed);

        let data: Arc<[AtomicU32]> = (0..dictionary.len() * dim)
            .map(|_| AtomicU32::new(dist.sample(&mut rng).to_bits()))
            .collect();

        Ok(Self {
            dictionary,
            dim,
            data,
        })
    }

    /// Allocate zero vectors.
    pub fn zeros(dictionary: Arc<NodeDictionary>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidDimension(dim));
        }
        let data: Arc<[AtomicU32]> = (0..dictionary.len() * dim)
            .map(|_| AtomicU32::new(0.0f32.to_bits()))
            .collect();
        Ok(Self {
            dictionary,
            dim,
            data,
        })
    }

    /// Load a node dictionary file and allocate randomly initialized vectors for it.
    pub fn from_node_file(path: impl AsRef<Path>, dim: usize, seed: u64) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidDimension(dim));
        }
        let dictionary = NodeDictionary::from_file(path)?;
        Self::new(Arc::new(dictionary), dim, seed)
    }

    /// The dictionary this store is indexed by.
    pub fn dictionary(&self) -> &Arc<NodeDictionary> {
        &self.dictionary
    }

    /// Number of vectors.
    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Live view of one node's vector.
    #[inline]
    pub fn vector_of(&self, index: NodeIndex) -> Result<VectorView<'_>> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let start = index * self.dim;
        Ok(VectorView {
            cells: &self.data[start..start + self.dim],
        })
    }

    /// Copy of one node's vector.
    pub fn vector(&self, index: NodeIndex) -> Result<Vec<f32>> {
        Ok(self.vector_of(index)?.to_vec())
    }

    /// Overwrite one node's vector.
    pub fn set_vector(&self, index: NodeIndex, values: &[f32]) -> Result<()> {
        if values.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: values.len(),
            });
        }
        let view = self.vector_of(index)?;
        for (i, &v) in values.iter().enumerate() {
            view.set(i, v);
        }
        Ok(())
    }

    /// Dot product between a vector of this store and a vector of `other`.
    pub fn dot(&self, a: NodeIndex, other: &EmbeddingStore, b: NodeIndex) -> Result<f32> {
        let va = self.vector_of(a)?;
        let vb = other.vector_of(b)?;
        Ok((0..self.dim.min(other.dim)).map(|i| va.get(i) * vb.get(i)).sum())
    }

    /// Write all vectors to `path` (text or binary).
    pub fn output(&self, path: impl AsRef<Path>, binary: bool) -> Result<()> {
        crate::io::write_embeddings(self, path, binary)
    }
}

/// Borrowed view of one vector inside an [`EmbeddingStore`].
#[derive(Debug, Clone, Copy)]
pub struct VectorView<'a> {
    cells: &'a [AtomicU32],
}

impl VectorView<'_> {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> f32 {
        f32::from_bits(self.cells[i].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, i: usize, value: f32) {
        self.cells[i].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Copy the current values into `out`.
    #[inline]
    pub fn read_into(&self, out: &mut [f32]) {
        for (o, c) in out.iter_mut().zip(self.cells) {
            *o = f32::from_bits(c.load(Ordering::Relaxed));
        }
    }

    /// Dot product with a local buffer.
    #[inline]
    pub fn dot(&self, other: &[f32]) -> f32 {
        self.cells
            .iter()
            .zip(other)
            .map(|(c, &x)| f32::from_bits(c.load(Ordering::Relaxed)) * x)
            .sum()
    }

    /// `self += scale * x`, one unsynchronized load/store per coordinate.
    #[inline]
    pub fn add_scaled(&self, scale: f32, x: &[f32]) {
        for (c, &xi) in self.cells.iter().zip(x) {
            let cur = f32::from_bits(c.load(Ordering::Relaxed));
            c.store((cur + scale * xi).to_bits(), Ordering::Relaxed);
        }
    }

    /// `self += x`.
    #[inline]
    pub fn add_assign(&self, x: &[f32]) {
        self.add_scaled(1.0, x);
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.cells
            .iter()
            .map(|c| f32::from_bits(c.load(Ordering::Relaxed)))
            .collect()
    }
}
