//! Registered migration steps, keyed by the version each one produces
//!
//! Versions in the supported range without an entry here only bump
//! `schemaVersion`.

mod artifacts;
mod elastic;
mod locking;
mod packages;
mod secrets;
mod tfs;

use crate::{MigrationContext, Result};
use cruise_xml::Element;

pub(crate) type Apply = fn(&mut Element, &MigrationContext<'_>) -> Result<()>;

/// One tree-to-tree transformation.
#[derive(Clone, Copy)]
pub(crate) struct Step {
    /// Version the document declares after this step.
    pub version: u32,
    pub description: &'static str,
    pub apply: Apply,
}

pub(crate) const STEPS: &[Step] = &[
    Step {
        version: 52,
        description: "split TFS domain out of username",
        apply: tfs::split_domain,
    },
    Step {
        version: 60,
        description: "typed artifacts",
        apply: artifacts::type_artifacts,
    },
    Step {
        version: 71,
        description: "fetch artifact origin",
        apply: artifacts::fetch_origin,
    },
    Step {
        version: 80,
        description: "lock behavior replaces isLocked",
        apply: locking::lock_behavior,
    },
    Step {
        version: 90,
        description: "strip whitespace from encrypted values",
        apply: secrets::strip_whitespace,
    },
    Step {
        version: 99,
        description: "ids for package repositories and packages",
        apply: packages::assign_ids,
    },
    Step {
        version: 109,
        description: "re-encrypt legacy DES values",
        apply: secrets::reencrypt_legacy,
    },
    Step {
        version: 110,
        description: "drop empty secure values",
        apply: secrets::drop_empty,
    },
    Step {
        version: 120,
        description: "cluster profiles for elastic profiles",
        apply: elastic::attach_cluster_profiles,
    },
];

/// Steps producing a version in `(from, to]`, in order.
pub(crate) fn between(from: u32, to: u32) -> impl Iterator<Item = &'static Step> {
    STEPS.iter().filter(move |s| s.version > from && s.version <= to)
}
