//! Secure value subsystem for cruise configuration
//!
//! Sensitive configuration fields are stored only as ciphertext tokens.
//! This crate provides:
//!
//! - **Token envelopes**: `AES:<iv>:<ciphertext>` for the current cipher,
//!   bare base64 for the legacy cipher, so both generations can coexist
//! - **SecureCipher**: encrypt, decrypt, and re-encrypt legacy tokens
//! - **Keys**: hex key files for both ciphers
//! - **Plugin metadata lookup**: decides whether a plugin property is secure
//!
//! # Example
//!
//! ```
//! use cruise_secure::SecureCipher;
//!
//! let cipher = SecureCipher::generate();
//! let token = cipher.encrypt("s3cr3t").unwrap();
//! assert_eq!(cipher.decrypt(&token).unwrap(), "s3cr3t");
//! ```

pub mod cipher;
pub mod error;
pub mod keys;
pub mod lookup;
pub mod token;

pub use cipher::SecureCipher;
pub use error::{Error, Result};
pub use keys::{AesKey, DEFAULT_DES_KEY_HEX, DesKey};
pub use lookup::{NoPluginMetadata, PluginMetadataStore, SecurePropertyLookup};
pub use token::{AES_PREFIX, Token, is_legacy_token, normalize};
