//! Error types for cruise-core

use cruise_validate::ValidationError;
use std::path::PathBuf;

/// Result type for cruise-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of loading, merging and settings handling
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document was structurally broken before any migration ran.
    #[error(transparent)]
    Codec(#[from] cruise_codec::Error),

    /// The document only became structurally broken after migration.
    #[error("Upgraded document is invalid: {source}")]
    InvalidUpgrade { source: cruise_codec::Error },

    /// Two sources define the same pipeline, template or environment.
    #[error("{kind} '{name}' is defined in both {first} and {second}")]
    Merge {
        kind: String,
        name: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Migration(#[from] cruise_migrate::Error),

    #[error(transparent)]
    Model(#[from] cruise_model::Error),

    #[error(transparent)]
    Secure(#[from] cruise_secure::Error),

    #[error("Configuration is invalid: {} error(s) found", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("Invalid settings in {path}: {message}")]
    Settings { path: PathBuf, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Validation errors carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Error::Validation(errors) => errors,
            _ => &[],
        }
    }
}
