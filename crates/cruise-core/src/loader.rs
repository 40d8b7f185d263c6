//! Loading a configuration file into its processed and editable forms
//!
//! The load pipeline is: migrate to the current schema, parse, encrypt
//! properties that plugins declare secure, then build the processed view by
//! preprocessing a copy, merging config-repository fragments and validating.

use crate::merge::merge;
use crate::preprocess::preprocess;
use crate::secure::encrypt_secure_properties;
use crate::{Error, Result};
use cruise_codec::DocumentCodec;
use cruise_migrate::{Clock, MigrationContext, MigrationReport, SystemClock, upgrade};
use cruise_model::{ConfigurationDocument, PartialConfig, RepoOrigin};
use cruise_secure::{NoPluginMetadata, SecureCipher, SecurePropertyLookup};
use cruise_validate::{ValidationError, Validator};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// The two views of a loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigHolder {
    /// Templates expanded, parameters resolved and fragments merged.
    pub config: ConfigurationDocument,
    /// The document as written in the file, used when persisting edits.
    pub config_for_edit: ConfigurationDocument,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub holder: ConfigHolder,
    pub migration: MigrationReport,
    /// The document text after migration.
    pub xml: String,
}

/// An editable document that may still carry validation errors.
#[derive(Debug, Clone)]
pub struct EditableConfig {
    pub config_for_edit: ConfigurationDocument,
    pub migration: MigrationReport,
    pub xml: String,
    pub errors: Vec<ValidationError>,
}

/// Output of migrating and parsing, before any processing.
struct Parsed {
    config_for_edit: ConfigurationDocument,
    migration: MigrationReport,
    xml: String,
}

pub struct ConfigLoader<'a> {
    cipher: &'a SecureCipher,
    lookup: &'a dyn SecurePropertyLookup,
    clock: &'a dyn Clock,
    allow_invalid_for_edit: bool,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(cipher: &'a SecureCipher) -> Self {
        Self {
            cipher,
            lookup: &NoPluginMetadata,
            clock: &SystemClock,
            allow_invalid_for_edit: true,
        }
    }

    /// Plugin metadata deciding which plugin properties are secure.
    pub fn with_lookup(mut self, lookup: &'a dyn SecurePropertyLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Clock stamped on migration reports.
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn allow_invalid_for_edit(mut self, allow: bool) -> Self {
        self.allow_invalid_for_edit = allow;
        self
    }

    /// Load the file at `path`, merging `fragments` into the processed view.
    pub fn load_file(&self, path: &Path, fragments: Vec<PartialConfig>) -> Result<LoadedConfig> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), "Loading configuration");
        self.load(&bytes, fragments)
    }

    /// Load a document. Any validation error of the processed view fails the load.
    pub fn load(&self, bytes: &[u8], fragments: Vec<PartialConfig>) -> Result<LoadedConfig> {
        let parsed = self.parse(bytes)?;
        let (config, errors) = self.process(&parsed.config_for_edit, fragments)?;
        if !errors.is_empty() {
            warn!(count = errors.len(), "Configuration failed validation");
            return Err(Error::Validation(errors));
        }

        info!(
            pipelines = config.all_pipelines().count(),
            schema_version = config.schema_version,
            "Configuration loaded"
        );
        Ok(LoadedConfig {
            holder: ConfigHolder {
                config,
                config_for_edit: parsed.config_for_edit,
            },
            migration: parsed.migration,
            xml: parsed.xml,
        })
    }

    /// Load the editable view only.
    ///
    /// Validation errors are returned alongside the document when invalid
    /// documents are allowed for editing, and fail the load otherwise.
    /// Structural and migration failures always fail.
    pub fn load_for_edit(&self, bytes: &[u8]) -> Result<EditableConfig> {
        let parsed = self.parse(bytes)?;
        let (_, errors) = self.process(&parsed.config_for_edit, Vec::new())?;
        if !errors.is_empty() && !self.allow_invalid_for_edit {
            return Err(Error::Validation(errors));
        }
        Ok(EditableConfig {
            config_for_edit: parsed.config_for_edit,
            migration: parsed.migration,
            xml: parsed.xml,
            errors,
        })
    }

    /// Parse a config-repository fragment, tagging it with `origin`.
    pub fn parse_partial(&self, bytes: &[u8], origin: RepoOrigin) -> Result<PartialConfig> {
        let mut partial = DocumentCodec::with_cipher(self.cipher).parse_partial(bytes, origin)?;
        let origin = partial.origin.clone();
        partial.set_origin(origin);
        Ok(partial)
    }

    fn parse(&self, bytes: &[u8]) -> Result<Parsed> {
        let context = MigrationContext::new(self.cipher).with_clock(self.clock);
        let upgraded = upgrade(bytes, &context)?;
        if !upgraded.report.is_noop() {
            info!(
                from = upgraded.report.from,
                to = upgraded.report.to,
                steps = upgraded.report.applied.len(),
                "Migrated configuration"
            );
        }

        let codec = DocumentCodec::with_cipher(self.cipher);
        let mut doc = codec.parse_document(upgraded.xml.as_bytes()).map_err(|source| {
            if upgraded.report.is_noop() {
                Error::Codec(source)
            } else {
                Error::InvalidUpgrade { source }
            }
        })?;

        let encrypted = encrypt_secure_properties(&mut doc, self.lookup, self.cipher)?;
        debug!(encrypted, "Parsed configuration");
        Ok(Parsed {
            config_for_edit: doc,
            migration: upgraded.report,
            xml: upgraded.xml,
        })
    }

    fn process(
        &self,
        config_for_edit: &ConfigurationDocument,
        fragments: Vec<PartialConfig>,
    ) -> Result<(ConfigurationDocument, Vec<ValidationError>)> {
        let mut config = config_for_edit.clone_for_edit();
        let mut errors = preprocess(&mut config);
        let config = merge(config, fragments)?;
        errors.extend(Validator::new(self.lookup).validate(&config));
        Ok((config, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cruise_migrate::FixedClock;
    use cruise_model::Origin;
    use cruise_secure::AesKey;
    use cruise_test_utils::fixtures;

    fn cipher() -> SecureCipher {
        SecureCipher::with_aes_key(AesKey::from_bytes([3; 16]))
    }

    #[test]
    fn test_load_keeps_editable_view_local() {
        let cipher = cipher();
        let loaded = ConfigLoader::new(&cipher)
            .load(fixtures::two_stage_pipeline().as_bytes(), Vec::new())
            .unwrap();

        assert!(loaded.migration.is_noop());
        assert_eq!(loaded.holder.config_for_edit.origin, Origin::File);
        assert_eq!(loaded.holder.config.origin, Origin::Merge);
        assert_eq!(loaded.holder.config.all_pipelines().count(), 1);
    }

    #[test]
    fn test_migration_report_uses_injected_clock() {
        let cipher = cipher();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = FixedClock(at);
        let loaded = ConfigLoader::new(&cipher)
            .with_clock(&clock)
            .load(fixtures::v88_with_des_variable().as_bytes(), Vec::new())
            .unwrap();

        assert_eq!(loaded.migration.from, 88);
        assert_eq!(loaded.migration.upgraded_at, at);
    }

    #[test]
    fn test_load_for_edit_carries_errors() {
        let cipher = cipher();
        let bytes = fixtures::fetch_from_later_stage();

        let editable = ConfigLoader::new(&cipher).load_for_edit(bytes.as_bytes()).unwrap();
        assert_eq!(editable.errors.len(), 1);
        assert_eq!(editable.config_for_edit.all_pipelines().count(), 2);

        let err = ConfigLoader::new(&cipher)
            .allow_invalid_for_edit(false)
            .load_for_edit(bytes.as_bytes())
            .unwrap_err();
        assert_eq!(err.validation_errors().len(), 1);
    }

    #[test]
    fn test_parse_partial_tags_origin() {
        let cipher = cipher();
        let partial = ConfigLoader::new(&cipher)
            .parse_partial(
                fixtures::partial_with_pipeline("remote").as_bytes(),
                RepoOrigin::new("abc").with_repo_id("repo-1"),
            )
            .unwrap();

        assert_eq!(partial.groups[0].pipelines()[0].origin.to_string(), "repo-1");
    }
}
