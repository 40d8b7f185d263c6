//! Configuration engine for cruise
//!
//! Ties the lower layers together: a configuration file is migrated to the
//! current schema, parsed, preprocessed (templates expanded, parameters
//! resolved), merged with config-repository fragments and validated.
//!
//! # Modules
//!
//! - [`loader`]: Load pipeline producing a [`ConfigHolder`]
//! - [`merge`]: Merging config-repository fragments
//! - [`preprocess`]: Template expansion and parameter substitution
//! - [`secure`]: Encryption of plugin-declared secure properties
//! - [`settings`]: Engine settings from `cruise.toml`
//! - [`backup`]: Timestamped copies before overwriting a file

pub mod backup;
pub mod error;
pub mod loader;
pub mod merge;
pub mod preprocess;
pub mod secure;
pub mod settings;

pub use backup::{BackupManager, ConfigBackup};
pub use error::{Error, Result};
pub use loader::{ConfigHolder, ConfigLoader, EditableConfig, LoadedConfig};
pub use merge::merge;
pub use preprocess::preprocess;
pub use secure::encrypt_secure_properties;
pub use settings::{BackupSettings, CipherSettings, EngineSettings, ValidationSettings};
