//! Structural codec for cruise configuration documents
//!
//! Reads the current schema version into a [`ConfigurationDocument`] and
//! writes it back in canonical form. Shape rules (child order, attribute
//! patterns, enumerations, exact-value identity constraints) are checked
//! while reading and the first violation stops the parse. Cross-entity rules
//! are not checked here.
//!
//! Anything serialized by this crate reads back to an equal model and
//! serializes to the same bytes again.
//!
//! ```
//! use cruise_codec::{parse_document, serialize};
//!
//! let xml = r#"<cruise schemaVersion="139">
//!   <pipelines group="first">
//!     <pipeline name="build">
//!       <materials><git url="https://example.com/app.git" /></materials>
//!       <stage name="compile"><jobs><job name="unit" /></jobs></stage>
//!     </pipeline>
//!   </pipelines>
//! </cruise>"#;
//! let doc = parse_document(xml.as_bytes())?;
//! assert!(doc.pipeline_by_name("BUILD").is_ok());
//! assert_eq!(serialize(&parse_document(serialize(&doc).as_bytes())?), serialize(&doc));
//! # Ok::<(), cruise_codec::Error>(())
//! ```

mod document;
mod environment;
pub mod error;
mod fragment;
mod job;
mod material;
mod pipeline;
mod plugin;
mod property;
mod schema;
mod security;
mod task;

pub use document::{serialize, serialize_partial, to_element};
pub use error::{Error, Result};
pub use fragment::{ExpectedType, Fragment, fragment_element, serialize_fragment};

use cruise_model::{ConfigurationDocument, PartialConfig, RepoOrigin};
use cruise_secure::SecureCipher;

/// Reader settings shared by every element reader.
///
/// Without a cipher, plaintext secrets (`password` attributes, secure
/// variables with a `<value>`) cannot be stored and the latter are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodec<'a> {
    cipher: Option<&'a SecureCipher>,
}

impl<'a> DocumentCodec<'a> {
    pub fn new() -> Self {
        Self { cipher: None }
    }

    /// Encrypt plaintext secrets with `cipher` while reading.
    pub fn with_cipher(cipher: &'a SecureCipher) -> Self {
        Self { cipher: Some(cipher) }
    }

    pub fn cipher(&self) -> Option<&'a SecureCipher> {
        self.cipher
    }
}

/// Parse a current-version document without a cipher.
pub fn parse_document(bytes: &[u8]) -> Result<ConfigurationDocument> {
    DocumentCodec::new().parse_document(bytes)
}

pub fn parse_fragment(bytes: &[u8], expected: ExpectedType) -> Result<Fragment> {
    DocumentCodec::new().parse_fragment(bytes, expected)
}

pub fn parse_partial(bytes: &[u8], origin: RepoOrigin) -> Result<PartialConfig> {
    DocumentCodec::new().parse_partial(bytes, origin)
}
