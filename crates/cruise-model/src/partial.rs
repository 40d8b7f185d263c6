//! Configuration fragments pulled from config repositories

use crate::{CaseInsensitiveString, EnvironmentConfig, Origin, PipelineGroup, RepoOrigin, Template};
use serde::Serialize;

/// Pipeline groups, environments and templates read from one config repository revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialConfig {
    pub origin: RepoOrigin,
    pub groups: Vec<PipelineGroup>,
    pub environments: Vec<EnvironmentConfig>,
    pub templates: Vec<Template>,
}

impl PartialConfig {
    pub fn new(origin: RepoOrigin) -> Self {
        Self {
            origin,
            groups: Vec::new(),
            environments: Vec::new(),
            templates: Vec::new(),
        }
    }

    /// Re-tag every contained entity with `origin`.
    pub fn set_origin(&mut self, origin: RepoOrigin) {
        let tag = Origin::Repo(origin.clone());
        for group in &mut self.groups {
            group.set_origin(tag.clone());
        }
        for environment in &mut self.environments {
            environment.origin = tag.clone();
        }
        for template in &mut self.templates {
            template.origin = tag.clone();
        }
        self.origin = origin;
    }

    pub fn pipeline_names(&self) -> impl Iterator<Item = &CaseInsensitiveString> {
        self.groups.iter().flat_map(|g| g.pipelines()).map(|p| &p.name)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.pipelines().is_empty()) && self.environments.is_empty() && self.templates.is_empty()
    }
}
