//! Semantic validation of cruise configuration documents
//!
//! The codec guarantees structural shape. Everything that needs knowledge of
//! more than one entity is checked here: global name uniqueness, references
//! between pipelines, templates, environments, roles and plugin entities,
//! fetch-artifact ordering along the dependency graph and agreement of shared
//! materials.
//!
//! Unlike parsing, validation never stops at the first problem. Every check in
//! the battery runs and the violations come back together:
//!
//! ```
//! use cruise_model::{ConfigurationDocument, Material, Pipeline};
//!
//! let mut doc = ConfigurationDocument::new();
//! let mut pipeline = Pipeline::new("empty");
//! pipeline.add_material(Material::git("https://example.com/app.git"));
//! doc.add_pipeline("defaultGroup", pipeline)?;
//!
//! let errors = cruise_validate::validate(&doc);
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].path, "pipeline[empty]");
//! # Ok::<(), cruise_model::Error>(())
//! ```

mod checks;
pub mod error;

pub use error::ValidationError;

use checks::Context;
use cruise_model::ConfigurationDocument;
use cruise_secure::{NoPluginMetadata, SecurePropertyLookup};
use error::Report;
use tracing::debug;

/// Runs the check battery with injected plugin metadata.
///
/// Metadata decides which package properties take part in package identity.
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    lookup: &'a dyn SecurePropertyLookup,
}

impl<'a> Validator<'a> {
    pub fn new(lookup: &'a dyn SecurePropertyLookup) -> Self {
        Self { lookup }
    }

    pub fn validate(&self, doc: &ConfigurationDocument) -> Vec<ValidationError> {
        let ctx = Context { doc, lookup: self.lookup };
        let mut report = Report::default();
        for (name, check) in checks::CHECKS {
            let before = report.len();
            check(&ctx, &mut report);
            debug!(check = name, errors = report.len() - before, "Validation check finished");
        }
        report.into_errors()
    }
}

impl std::fmt::Debug for Validator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

/// Validate without plugin metadata: every package property is identity.
pub fn validate(doc: &ConfigurationDocument) -> Vec<ValidationError> {
    Validator::new(&NoPluginMetadata).validate(doc)
}
