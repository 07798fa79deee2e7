use prosnet_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur in prosnet-train.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the data layer (loading, sampling, dumping).
    #[error(transparent)]
    Core(#[from] prosnet_core::Error),
    /// Worker pool could not be started.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// Invalid training configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Core(e) => e.kind(),
            Error::ThreadPool(_) => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for prosnet-train.
pub type Result<T> = std::result::Result<T, Error>;
