use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in prosnet-core.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed line in an input file.
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    /// Invalid or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Embedding dimension must be positive.
    #[error("Invalid embedding dimension: {0}")]
    InvalidDimension(usize),
    /// Link references a node that is not in the dictionary.
    #[error("Unknown node: {0}")]
    UnknownNode(String),
    /// Edge type has no partition in the graph.
    #[error("Unknown edge type: {0}")]
    UnknownEdgeType(String),
    /// Edge type exists but has nothing to sample from.
    #[error("Edge type '{0}' has no edges to sample")]
    EmptyPartition(String),
    /// Weights cannot form a distribution.
    #[error("Invalid sampling weights: {0}")]
    InvalidWeights(String),
    /// Two structures that must agree on size do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Node index out of range.
    #[error("Node index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Coarse error classes used to decide how a failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input configuration; fatal before training starts.
    Config,
    /// Unreadable input or unwritable output.
    Io,
    /// Recoverable: the edge type contributes no work.
    EmptyPartition,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Parse { .. } => ErrorKind::Io,
            Error::EmptyPartition(_) => ErrorKind::EmptyPartition,
            Error::Config(_)
            | Error::InvalidDimension(_)
            | Error::UnknownNode(_)
            | Error::UnknownEdgeType(_)
            | Error::InvalidWeights(_)
            | Error::DimensionMismatch { .. }
            | Error::IndexOutOfRange { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn parse(path: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for prosnet-core.
pub type Result<T> = std::result::Result<T, Error>;
