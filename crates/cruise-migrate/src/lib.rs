//! Schema-version migration chain
//!
//! Historical documents are upgraded on the [`cruise_xml`] tree before the
//! codec reads them. Each step is a plain function over the tree registered
//! under the version it produces; versions without a step only change
//! `schemaVersion`. Steps may use the [`SecureCipher`](cruise_secure::SecureCipher)
//! from the [`MigrationContext`] to re-encrypt legacy tokens.
//!
//! ```
//! use cruise_migrate::{MigrationContext, upgrade};
//! use cruise_secure::SecureCipher;
//!
//! let cipher = SecureCipher::generate();
//! let xml = r#"<cruise schemaVersion="75"><pipelines><pipeline name="p" isLocked="true" /></pipelines></cruise>"#;
//! let upgraded = upgrade(xml.as_bytes(), &MigrationContext::new(&cipher))?;
//!
//! assert!(upgraded.xml.contains(r#"lockBehavior="lockOnFailure""#));
//! assert_eq!(upgraded.report.applied, [80, 90, 99, 109, 110, 120]);
//! # Ok::<(), cruise_migrate::Error>(())
//! ```

pub mod context;
pub mod error;
mod steps;
pub mod upgrade;

pub use context::{Clock, FixedClock, MigrationContext, SystemClock};
pub use error::{Error, Result};
pub use upgrade::{MigrationReport, Upgraded, declared_version, upgrade, upgrade_tree};

/// Version produced by the last step of the chain.
pub const CURRENT_SCHEMA_VERSION: u32 = 139;

/// Oldest version the chain accepts.
pub const OLDEST_SUPPORTED_VERSION: u32 = 50;
