//! Training and checkpoint configuration.
//!
//! Defaults match the command-line defaults.
//!
//! ```rust
//! use prosnet_train::TrainConfig;
//!
//! let config = TrainConfig::default()
//!     .with_dim(64)
//!     .with_threads(4)
//!     .with_train_mode(3);
//! assert!(config.validate().is_ok());
//! ```

use crate::curriculum::NUM_CURRICULA;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Training configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainConfig {
    /// Embedding dimension (default: 100).
    pub dim: usize,
    /// Negative samples per positive edge (default: 5).
    pub negative: usize,
    /// Edges per worker segment, summed over threads (default: 1,000,000).
    pub samples: u64,
    /// Epochs (default: 10).
    pub iters: usize,
    /// Worker threads (default: 1).
    pub threads: usize,
    /// Starting learning rate (default: 0.0025).
    pub starting_alpha: f32,
    /// Curriculum id, 0..=6 (default: 0).
    pub train_mode: usize,
    /// RNG seed for initialization and sampling (default: 1).
    pub seed: u64,
    /// Budget units a worker charges per outer iteration (20 batches over
    /// every trainer). `None` charges the number of sampleable edge types.
    pub edge_type_num: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dim: 100,
            negative: 5,
            samples: 1_000_000,
            iters: 10,
            threads: 1,
            starting_alpha: 0.0025,
            train_mode: 0,
            seed: 1,
            edge_type_num: None,
        }
    }
}

impl TrainConfig {
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_negative(mut self, negative: usize) -> Self {
        self.negative = negative;
        self
    }

    pub fn with_samples(mut self, samples: u64) -> Self {
        self.samples = samples;
        self
    }

    /// Set the sample budget in millions, as the command line takes it.
    pub fn with_samples_millions(mut self, millions: f64) -> Self {
        self.samples = (millions * 1_000_000.0).max(0.0) as u64;
        self
    }

    pub fn with_iters(mut self, iters: usize) -> Self {
        self.iters = iters;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.starting_alpha = alpha;
        self
    }

    pub fn with_train_mode(mut self, train_mode: usize) -> Self {
        self.train_mode = train_mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_edge_type_num(mut self, n: usize) -> Self {
        self.edge_type_num = Some(n);
        self
    }

    /// Check every field before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::Config("embedding dimension must be positive".into()));
        }
        if self.threads == 0 {
            return Err(Error::Config("thread count must be positive".into()));
        }
        if !self.starting_alpha.is_finite() || self.starting_alpha <= 0.0 {
            return Err(Error::Config(format!(
                "learning rate must be positive and finite, got {}",
                self.starting_alpha
            )));
        }
        if self.samples == 0 {
            return Err(Error::Config("sample budget must be positive".into()));
        }
        if self.edge_type_num == Some(0) {
            return Err(Error::Config("edge_type_num must be positive".into()));
        }
        if self.train_mode >= NUM_CURRICULA {
            return Err(Error::Config(format!(
                "train_mode must be in 0..={}, got {}",
                NUM_CURRICULA - 1,
                self.train_mode
            )));
        }
        Ok(())
    }
}

/// Where and how embeddings are dumped.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckpointConfig {
    /// Directory for periodic dumps (default: `result`).
    pub dir: PathBuf,
    /// Node file stem used as the file name prefix.
    pub node_stem: String,
    /// Binary dump format (default: text).
    pub binary: bool,
    /// Final dump path; when `None` the final dump uses the periodic template.
    pub output: Option<PathBuf>,
    /// Random-walk depth tag (default: 2).
    pub depth: usize,
    /// Restart probability tag (default: 0.3).
    pub restart: f64,
    /// PPI random-walk-with-restart tag (default: 0).
    pub rwr_ppi: i64,
    /// Sequence random-walk-with-restart tag (default: 0).
    pub rwr_seq: i64,
    /// Edge type count tag (default: 0).
    pub edge_type_num: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("result"),
            node_stem: "node".to_string(),
            binary: false,
            output: None,
            depth: 2,
            restart: 0.3,
            rwr_ppi: 0,
            rwr_seq: 0,
            edge_type_num: 0,
        }
    }
}

impl CheckpointConfig {
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Use the stem of the node file as name prefix.
    pub fn with_node_file(mut self, path: &Path) -> Self {
        if let Some(stem) = path.file_stem() {
            self.node_stem = stem.to_string_lossy().into_owned();
        }
        self
    }

    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_restart(mut self, restart: f64) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_rwr(mut self, rwr_ppi: i64, rwr_seq: i64) -> Self {
        self.rwr_ppi = rwr_ppi;
        self.rwr_seq = rwr_seq;
        self
    }

    pub fn with_edge_type_num(mut self, n: usize) -> Self {
        self.edge_type_num = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let base = TrainConfig::default();
        assert!(base.clone().with_dim(0).validate().is_err());
        assert!(base.clone().with_threads(0).validate().is_err());
        assert!(base.clone().with_alpha(0.0).validate().is_err());
        assert!(base.clone().with_alpha(f32::NAN).validate().is_err());
        assert!(base.clone().with_samples(0).validate().is_err());
        assert!(base.clone().with_train_mode(7).validate().is_err());
        assert!(base.clone().with_edge_type_num(0).validate().is_err());
        assert!(base.clone().with_edge_type_num(23).validate().is_ok());
        assert!(base.with_train_mode(6).validate().is_ok());
    }

    #[test]
    fn test_samples_in_millions() {
        assert_eq!(TrainConfig::default().with_samples_millions(0.1).samples, 100_000);
        assert_eq!(TrainConfig::default().with_samples_millions(2.0).samples, 2_000_000);
    }

    #[test]
    fn test_node_stem() {
        let c = CheckpointConfig::default().with_node_file(Path::new("../data/node.dat"));
        assert_eq!(c.node_stem, "node");
    }
}
