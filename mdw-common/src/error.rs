//! Common error types for MDW

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for MDW operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across MDW components
#[derive(Error, Debug)]
pub enum Error {
    /// Run path does not follow the directory naming convention
    #[error("Malformed run path {path:?}: {reason}")]
    MalformedPath { path: PathBuf, reason: String },

    /// Companion metadata file for a run is absent
    #[error("Missing metadata file: {0:?}")]
    MissingMetadata(PathBuf),

    /// Metadata file exists but cannot be parsed into the expected fields
    #[error("Malformed metadata in {path:?}: {reason}")]
    MalformedMetadata { path: PathBuf, reason: String },

    /// Candidate run could not be built from its path (wraps the specific cause)
    #[error("Invalid run path {path:?}: {source}")]
    InvalidRunPath {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Wrap an error as an `InvalidRunPath` for the given candidate.
    pub fn invalid_run_path(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::InvalidRunPath {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error concerns a single candidate file rather than
    /// the warehouse as a whole. Candidate-local errors are isolated by
    /// the reconciliation engine; everything else aborts the pass.
    pub fn is_candidate_local(&self) -> bool {
        matches!(
            self,
            Error::MalformedPath { .. }
                | Error::MissingMetadata(_)
                | Error::MalformedMetadata { .. }
                | Error::InvalidRunPath { .. }
        )
    }
}
