//! Artifacts published by a job

use crate::Configuration;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltinArtifact {
    pub src: String,
    pub dest: Option<String>,
}

/// Artifact uploaded to an external artifact store by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluggableArtifact {
    pub id: String,
    pub store_id: String,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactConfig {
    Build(BuiltinArtifact),
    Test(BuiltinArtifact),
    External(PluggableArtifact),
}

impl ArtifactConfig {
    pub fn build(src: impl Into<String>, dest: Option<&str>) -> Self {
        ArtifactConfig::Build(BuiltinArtifact {
            src: src.into(),
            dest: dest.map(str::to_string),
        })
    }

    pub fn test(src: impl Into<String>, dest: Option<&str>) -> Self {
        ArtifactConfig::Test(BuiltinArtifact {
            src: src.into(),
            dest: dest.map(str::to_string),
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ArtifactConfig::Build(_) => "build",
            ArtifactConfig::Test(_) => "test",
            ArtifactConfig::External(_) => "external",
        }
    }
}
