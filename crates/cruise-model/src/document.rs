//! The configuration document: root aggregate of every entity

use crate::{
    ArtifactStore, CaseInsensitiveString, ConfigRepoConfig, ElasticConfig, EnvironmentConfig, Error, Job, Material,
    Origin, PackageDefinition, PackageRepository, Pipeline, PipelineGroup, Result, Scm, SecretConfig, ServerConfig,
    Stage, Template,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Schema version written by this engine.
pub const CURRENT_SCHEMA_VERSION: u32 = 139;

/// Root of the configuration tree.
///
/// Collections at this level may hold entities with clashing names: global
/// uniqueness involves several collections (and merged fragments), so it is
/// left to semantic validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationDocument {
    pub schema_version: u32,
    pub server: ServerConfig,
    pub config_repos: Vec<ConfigRepoConfig>,
    pub elastic: ElasticConfig,
    pub artifact_stores: Vec<ArtifactStore>,
    pub secret_configs: Vec<SecretConfig>,
    pub repositories: Vec<PackageRepository>,
    pub scms: Vec<Scm>,
    pub groups: Vec<PipelineGroup>,
    pub templates: Vec<Template>,
    pub environments: Vec<EnvironmentConfig>,
    pub origin: Origin,
}

impl Default for ConfigurationDocument {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            server: ServerConfig::default(),
            config_repos: Vec::new(),
            elastic: ElasticConfig::default(),
            artifact_stores: Vec::new(),
            secret_configs: Vec::new(),
            repositories: Vec::new(),
            scms: Vec::new(),
            groups: Vec::new(),
            templates: Vec::new(),
            environments: Vec::new(),
            origin: Origin::File,
        }
    }
}

impl ConfigurationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully independent copy for editing. Nothing is shared with `self`.
    pub fn clone_for_edit(&self) -> Self {
        self.clone()
    }

    /// Add `pipeline` to `group`, creating the group when needed.
    ///
    /// Fails if a pipeline with the same name exists in any group.
    pub fn add_pipeline(&mut self, group: &str, pipeline: Pipeline) -> Result<()> {
        if self.has_pipeline(&pipeline.name) {
            return Err(Error::multiple("pipelines", "Pipeline", pipeline.name.as_str()));
        }
        match self.groups.iter_mut().find(|g| g.name.matches(group)) {
            Some(existing) => existing.add_pipeline(pipeline),
            None => {
                let mut new_group = PipelineGroup::new(group);
                new_group.add_pipeline(pipeline)?;
                self.groups.push(new_group);
                Ok(())
            }
        }
    }

    pub fn group_by_name(&self, name: &str) -> Result<&PipelineGroup> {
        self.groups
            .iter()
            .find(|g| g.name.matches(name))
            .ok_or_else(|| Error::not_found("Pipeline group", name))
    }

    pub fn all_pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        self.groups.iter().flat_map(|g| g.pipelines())
    }

    pub fn all_pipelines_mut(&mut self) -> impl Iterator<Item = &mut Pipeline> {
        self.groups.iter_mut().flat_map(|g| g.pipelines_mut().iter_mut())
    }

    pub fn all_pipeline_names(&self) -> Vec<&CaseInsensitiveString> {
        self.all_pipelines().map(|p| &p.name).collect()
    }

    pub fn has_pipeline(&self, name: &CaseInsensitiveString) -> bool {
        self.all_pipelines().any(|p| &p.name == name)
    }

    /// Case-insensitive pipeline lookup.
    pub fn pipeline_by_name(&self, name: &str) -> Result<&Pipeline> {
        self.all_pipelines()
            .find(|p| p.name.matches(name))
            .ok_or_else(|| Error::not_found("Pipeline", name))
    }

    pub fn pipeline_by_name_mut(&mut self, name: &str) -> Result<&mut Pipeline> {
        self.all_pipelines_mut()
            .find(|p| p.name.matches(name))
            .ok_or_else(|| Error::not_found("Pipeline", name))
    }

    pub fn stage_by_name(&self, pipeline: &str, stage: &str) -> Result<&Stage> {
        self.pipeline_by_name(pipeline)?.stage_by_name(stage)
    }

    pub fn job_by_name(&self, pipeline: &str, stage: &str, job: &str) -> Result<&Job> {
        self.stage_by_name(pipeline, stage)?.job(job)
    }

    pub fn template_by_name(&self, name: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.name.matches(name))
            .ok_or_else(|| Error::not_found("Template", name))
    }

    pub fn environment_by_name(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments
            .iter()
            .find(|e| e.name.matches(name))
            .ok_or_else(|| Error::not_found("Environment", name))
    }

    pub fn find_group_of_pipeline(&self, name: &str) -> Option<&PipelineGroup> {
        self.groups.iter().find(|g| g.pipeline(name).is_some())
    }

    pub fn environment_for_pipeline(&self, name: &CaseInsensitiveString) -> Option<&EnvironmentConfig> {
        self.environments.iter().find(|e| e.contains_pipeline(name))
    }

    pub fn scm(&self, id: &str) -> Option<&Scm> {
        self.scms.iter().find(|s| s.id == id)
    }

    pub fn artifact_store(&self, id: &str) -> Option<&ArtifactStore> {
        self.artifact_stores.iter().find(|s| s.id == id)
    }

    pub fn secret_config(&self, id: &str) -> Option<&SecretConfig> {
        self.secret_configs.iter().find(|s| s.id == id)
    }

    /// Repository and definition of a package id.
    pub fn package(&self, package_id: &str) -> Option<(&PackageRepository, &PackageDefinition)> {
        self.repositories
            .iter()
            .find_map(|r| r.package(package_id).map(|p| (r, p)))
    }

    /// Pipelines named in the dependency materials of `name`.
    pub fn upstream_pipelines(&self, name: &str) -> Result<Vec<&CaseInsensitiveString>> {
        Ok(self.pipeline_by_name(name)?.dependencies().map(|(p, _)| p).collect())
    }

    /// Pipelines with a dependency material on `name`.
    pub fn downstream_pipelines(&self, name: &str) -> Vec<&CaseInsensitiveString> {
        let target = CaseInsensitiveString::new(name);
        self.all_pipelines()
            .filter(|p| p.depends_on(&target))
            .map(|p| &p.name)
            .collect()
    }

    /// Pipelines ordered so every upstream comes before its downstreams.
    ///
    /// Dependencies on unknown pipelines are ignored here.
    pub fn dependency_order(&self) -> Result<Vec<CaseInsensitiveString>> {
        let graph: HashMap<&CaseInsensitiveString, Vec<&CaseInsensitiveString>> = self
            .all_pipelines()
            .map(|p| (&p.name, p.dependencies().map(|(up, _)| up).collect()))
            .collect();

        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        for pipeline in self.all_pipelines() {
            visit(&pipeline.name, &graph, &mut visiting, &mut done, &mut order)?;
        }
        Ok(order)
    }

    /// One material per fingerprint, across every pipeline.
    pub fn all_unique_materials(&self) -> Vec<&Material> {
        let mut seen = HashSet::new();
        self.all_pipelines()
            .flat_map(|p| p.materials())
            .filter(|m| seen.insert(m.fingerprint()))
            .collect()
    }

    /// Pipelines using a material with `fingerprint`.
    pub fn pipelines_with_material(&self, fingerprint: &str) -> Vec<&Pipeline> {
        self.all_pipelines()
            .filter(|p| p.materials().iter().any(|m| m.fingerprint() == fingerprint))
            .collect()
    }

    /// Pipelines defined in the primary file.
    pub fn local_pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        self.all_pipelines().filter(|p| p.origin.is_local())
    }
}

fn visit<'a>(
    name: &'a CaseInsensitiveString,
    graph: &HashMap<&'a CaseInsensitiveString, Vec<&'a CaseInsensitiveString>>,
    visiting: &mut Vec<&'a CaseInsensitiveString>,
    done: &mut HashSet<&'a CaseInsensitiveString>,
    order: &mut Vec<CaseInsensitiveString>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = visiting.iter().position(|v| *v == name) {
        let mut chain: Vec<String> = visiting[start..].iter().rev().map(|p| p.to_string()).collect();
        chain.insert(0, name.to_string());
        return Err(Error::CircularDependency {
            chain: chain.join(" <- "),
        });
    }
    let Some(upstreams) = graph.get(name) else {
        return Ok(());
    };
    visiting.push(name);
    for upstream in upstreams {
        if let Some((key, _)) = graph.get_key_value(*upstream) {
            visit(key, graph, visiting, done, order)?;
        }
    }
    visiting.pop();
    done.insert(name);
    order.push(name.clone());
    Ok(())
}
