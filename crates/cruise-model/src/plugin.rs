//! Plugin-scoped entities: secret configs, artifact stores, elastic profiles,
//! package repositories and pluggable SCMs

use crate::{Configuration, Material, PluginConfiguration, PolicyRule, PropertyValue, security};
use cruise_secure::SecurePropertyLookup;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretConfig {
    pub id: String,
    pub plugin_id: String,
    pub description: Option<String>,
    pub configuration: Configuration,
    pub rules: Vec<PolicyRule>,
}

impl SecretConfig {
    /// Whether an entity of `entity_type` named `entity_name` may use secrets from this store.
    pub fn can_be_referred_by(&self, entity_type: &str, entity_name: &str) -> bool {
        security::is_allowed(&self.rules, "refer", entity_type, entity_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStore {
    pub id: String,
    pub plugin_id: String,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterProfile {
    pub id: String,
    pub plugin_id: String,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElasticProfile {
    pub id: String,
    pub cluster_profile_id: String,
    pub plugin_id: String,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElasticConfig {
    /// Minutes a job may wait for an elastic agent.
    pub job_starvation_timeout: Option<u64>,
    pub cluster_profiles: Vec<ClusterProfile>,
    pub profiles: Vec<ElasticProfile>,
}

impl ElasticConfig {
    pub const DEFAULT_STARVATION_MINUTES: u64 = 2;

    pub fn job_starvation_timeout(&self) -> Duration {
        let minutes = self
            .job_starvation_timeout
            .unwrap_or(Self::DEFAULT_STARVATION_MINUTES);
        Duration::from_millis(minutes * 60_000)
    }

    pub fn profile(&self, id: &str) -> Option<&ElasticProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn cluster_profile(&self, id: &str) -> Option<&ClusterProfile> {
        self.cluster_profiles.iter().find(|p| p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.job_starvation_timeout.is_none() && self.cluster_profiles.is_empty() && self.profiles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDefinition {
    pub id: String,
    pub name: String,
    pub auto_update: bool,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRepository {
    pub id: String,
    pub name: String,
    pub plugin: PluginConfiguration,
    pub configuration: Configuration,
    pub packages: Vec<PackageDefinition>,
}

impl PackageRepository {
    pub fn package(&self, id: &str) -> Option<&PackageDefinition> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Identity of a package of this repository, from the identity-marked
    /// plain properties of both the repository and the package.
    pub fn package_identity(&self, package: &PackageDefinition, metadata: &dyn SecurePropertyLookup) -> String {
        let plugin = &self.plugin.id;
        let mut parts: Vec<String> = self
            .configuration
            .iter()
            .chain(package.configuration.iter())
            .filter(|p| !p.is_secure() && metadata.is_part_of_identity(plugin, &p.key))
            .map(|p| match &p.value {
                PropertyValue::Plain(v) => format!("{}={}", p.key, v),
                PropertyValue::Encrypted(_) => String::new(),
            })
            .collect();
        parts.sort();
        format!("{}|{}", plugin, parts.join("|"))
    }
}

/// A pluggable SCM definition referenced by `scm` materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scm {
    pub id: String,
    pub name: String,
    pub auto_update: bool,
    pub plugin: PluginConfiguration,
    pub configuration: Configuration,
}

/// A repository whose files define additional pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigRepoConfig {
    pub id: String,
    pub plugin_id: String,
    pub material: Material,
    pub configuration: Configuration,
}
