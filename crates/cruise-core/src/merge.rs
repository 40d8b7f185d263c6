//! Merging config-repository fragments into the file document

use crate::{Error, Result};
use cruise_model::{CaseInsensitiveString, ConfigurationDocument, Origin, PartialConfig};
use std::collections::HashMap;
use tracing::info;

/// Names already claimed, per entity kind, with the origin that claimed them.
#[derive(Default)]
struct Claims {
    owners: HashMap<(&'static str, String), Origin>,
}

impl Claims {
    /// Record a name from the file itself. Duplicates within the file are
    /// left for validation to report.
    fn seed(&mut self, kind: &'static str, name: &CaseInsensitiveString, origin: &Origin) {
        self.owners
            .entry((kind, name.key().to_string()))
            .or_insert_with(|| origin.clone());
    }

    fn claim(&mut self, kind: &'static str, name: &CaseInsensitiveString, origin: &Origin) -> Result<()> {
        match self.owners.get(&(kind, name.key().to_string())) {
            Some(first) => Err(Error::Merge {
                kind: kind.to_string(),
                name: name.to_string(),
                first: first.to_string(),
                second: origin.to_string(),
            }),
            None => {
                self.owners.insert((kind, name.key().to_string()), origin.clone());
                Ok(())
            }
        }
    }
}

/// Merge `fragments` into `base`.
///
/// Every fragment entity is tagged with its repository origin. A pipeline,
/// template or environment name claimed by a fragment must not already exist
/// in the base or an earlier fragment. The result is tagged [`Origin::Merge`], even with no fragments.
pub fn merge(mut base: ConfigurationDocument, fragments: Vec<PartialConfig>) -> Result<ConfigurationDocument> {
    let mut claims = Claims::default();
    for pipeline in base.all_pipelines() {
        claims.seed("Pipeline", &pipeline.name, &pipeline.origin);
    }
    for template in &base.templates {
        claims.seed("Template", &template.name, &template.origin);
    }
    for environment in &base.environments {
        claims.seed("Environment", &environment.name, &environment.origin);
    }

    let count = fragments.len();
    for mut fragment in fragments {
        fragment.set_origin(fragment.origin.clone());
        let origin = Origin::Repo(fragment.origin.clone());
        for name in fragment.pipeline_names() {
            claims.claim("Pipeline", name, &origin)?;
        }
        for template in &fragment.templates {
            claims.claim("Template", &template.name, &origin)?;
        }
        for environment in &fragment.environments {
            claims.claim("Environment", &environment.name, &origin)?;
        }

        for group in fragment.groups {
            match base.groups.iter_mut().find(|g| g.name == group.name) {
                Some(existing) => {
                    for pipeline in group.pipelines() {
                        existing.add_pipeline(pipeline.clone())?;
                    }
                }
                None => base.groups.push(group),
            }
        }
        base.templates.extend(fragment.templates);
        base.environments.extend(fragment.environments);
    }

    base.origin = Origin::Merge;
    info!(fragments = count, pipelines = base.all_pipelines().count(), "Merged configuration");
    Ok(base)
}
