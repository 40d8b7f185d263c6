//! Error types for cruise-codec

use crate::ExpectedType;

/// Result type for cruise-codec operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document does not have the required shape. Parsing stops here.
    #[error("{message}")]
    Structural { element: String, message: String },

    /// A fragment's root element is not the requested entity type.
    #[error("Expected a {expected} fragment but found <{found}>")]
    TypeMismatch { expected: ExpectedType, found: String },

    #[error("Document declares schema version {found}, expected {expected}")]
    VersionMismatch { found: String, expected: u32 },

    #[error(transparent)]
    Xml(#[from] cruise_xml::Error),

    /// A local invariant of the model rejected the parsed data.
    #[error(transparent)]
    Model(#[from] cruise_model::Error),

    #[error(transparent)]
    Secure(#[from] cruise_secure::Error),
}

impl Error {
    pub fn structural(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Structural {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Whether this is a shape error (as opposed to a model or cipher error).
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Structural { .. } | Error::TypeMismatch { .. } | Error::Xml(_))
    }
}
