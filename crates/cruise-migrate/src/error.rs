//! Error types for cruise-migrate

/// Result type for cruise-migrate operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Document does not declare a schemaVersion")]
    MissingVersion,

    #[error("Invalid schemaVersion '{value}'")]
    InvalidVersion { value: String },

    #[error("Schema version {found} is older than the oldest supported version {oldest}")]
    UnsupportedVersion { found: u32, oldest: u32 },

    #[error("Cannot downgrade from schema version {found} to {current}")]
    CannotDowngrade { found: u32, current: u32 },

    /// Legacy input a step cannot transform.
    #[error("Migration to version {version} failed: {message}")]
    Precondition { version: u32, message: String },

    #[error(transparent)]
    Xml(#[from] cruise_xml::Error),

    #[error(transparent)]
    Secure(#[from] cruise_secure::Error),
}

impl Error {
    pub(crate) fn precondition(version: u32, message: impl Into<String>) -> Self {
        Self::Precondition {
            version,
            message: message.into(),
        }
    }
}
