//! Running the chain over a document

use crate::steps;
use crate::{CURRENT_SCHEMA_VERSION, Error, MigrationContext, OLDEST_SUPPORTED_VERSION, Result};
use chrono::{DateTime, Utc};
use cruise_xml::Element;
use serde::Serialize;
use tracing::{debug, info};

/// What an upgrade did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub from: u32,
    pub to: u32,
    /// Versions whose steps ran, in order. Schema-only bumps are not listed.
    pub applied: Vec<u32>,
    pub upgraded_at: DateTime<Utc>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// An upgraded document with its report.
#[derive(Debug, Clone)]
pub struct Upgraded {
    pub xml: String,
    pub report: MigrationReport,
}

/// The version declared on the root element.
pub fn declared_version(root: &Element) -> Result<u32> {
    let value = root.attr("schemaVersion").ok_or(Error::MissingVersion)?;
    value.trim().parse().map_err(|_| Error::InvalidVersion {
        value: value.to_string(),
    })
}

/// Upgrade a parsed tree in place to the current version.
pub fn upgrade_tree(root: &mut Element, context: &MigrationContext<'_>) -> Result<MigrationReport> {
    let from = declared_version(root)?;
    if from > CURRENT_SCHEMA_VERSION {
        return Err(Error::CannotDowngrade {
            found: from,
            current: CURRENT_SCHEMA_VERSION,
        });
    }
    if from < OLDEST_SUPPORTED_VERSION {
        return Err(Error::UnsupportedVersion {
            found: from,
            oldest: OLDEST_SUPPORTED_VERSION,
        });
    }

    let mut applied = Vec::new();
    for step in steps::between(from, CURRENT_SCHEMA_VERSION) {
        debug!(version = step.version, step = step.description, "applying migration");
        (step.apply)(root, context)?;
        root.set_attr("schemaVersion", step.version.to_string());
        applied.push(step.version);
    }
    root.set_attr("schemaVersion", CURRENT_SCHEMA_VERSION.to_string());
    if from != CURRENT_SCHEMA_VERSION {
        info!(from, to = CURRENT_SCHEMA_VERSION, steps = applied.len(), "upgraded configuration");
    }
    Ok(MigrationReport {
        from,
        to: CURRENT_SCHEMA_VERSION,
        applied,
        upgraded_at: context.clock.now(),
    })
}

/// Upgrade document bytes. A document at the current version comes back unchanged.
pub fn upgrade(bytes: &[u8], context: &MigrationContext<'_>) -> Result<Upgraded> {
    let mut root = cruise_xml::parse_bytes(bytes)?;
    let report = upgrade_tree(&mut root, context)?;
    let xml = if report.is_noop() {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        cruise_xml::write_document(&root)
    };
    Ok(Upgraded { xml, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::context;
    use rstest::rstest;

    #[rstest]
    #[case(r#"<cruise />"#, "Document does not declare a schemaVersion")]
    #[case(r#"<cruise schemaVersion="abc" />"#, "Invalid schemaVersion 'abc'")]
    #[case(r#"<cruise schemaVersion="12" />"#, "Schema version 12 is older than the oldest supported version 50")]
    #[case(r#"<cruise schemaVersion="999" />"#, "Cannot downgrade from schema version 999 to 139")]
    fn test_version_errors(#[case] xml: &str, #[case] message: &str) {
        let err = upgrade(xml.as_bytes(), &context()).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_current_version_is_untouched() {
        let xml = "<cruise   schemaVersion=\"139\"><server/></cruise>";
        let upgraded = upgrade(xml.as_bytes(), &context()).unwrap();
        assert_eq!(upgraded.xml, xml);
        assert!(upgraded.report.is_noop());
        assert!(upgraded.report.applied.is_empty());
    }

    #[test]
    fn test_report_lists_steps_after_start() {
        let upgraded = upgrade(br#"<cruise schemaVersion="100" />"#, &context()).unwrap();
        assert_eq!(upgraded.report.applied, [109, 110, 120]);
        assert_eq!(upgraded.report.to, CURRENT_SCHEMA_VERSION);
        assert!(upgraded.xml.contains(r#"schemaVersion="139""#));
    }
}
