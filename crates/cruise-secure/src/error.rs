//! Error types for cruise-secure

use std::path::PathBuf;

/// Result type for cruise-secure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while handling keys and ciphertext tokens
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unrecognized ciphertext envelope: {token}")]
    UnknownEnvelope { token: String },

    #[error("Could not decrypt value: {message}")]
    Decryption { message: String },

    #[error("Could not encrypt value: {message}")]
    Encryption { message: String },

    #[error("Invalid {cipher} key: {message}")]
    InvalidKey { cipher: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    pub fn invalid_key(cipher: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            cipher: cipher.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
