//! Domain model of the cruise configuration document
//!
//! The document is an owned tree rooted at [`ConfigurationDocument`]:
//!
//! - **Groups and pipelines**: stages, jobs, tasks, materials, parameters
//! - **Templates and environments**: shared stage lists, pipeline/agent sets
//! - **Security**: roles, policy rules, authorization lists
//! - **Plugin entities**: secret configs, artifact stores, elastic profiles,
//!   package repositories, pluggable SCMs, config repositories
//!
//! Constructors and mutators enforce local invariants (uniqueness inside one
//! collection, mutually exclusive fields, non-empty job lists) and fail with
//! [`Error`] instead of accepting bad data. Rules spanning several entities
//! belong to semantic validation. Every name compares case-insensitively
//! through [`CaseInsensitiveString`].
//!
//! # Example
//!
//! ```
//! use cruise_model::{ConfigurationDocument, Material, Pipeline};
//!
//! let mut doc = ConfigurationDocument::new();
//! let pipeline = Pipeline::with_stages("build", Material::git("https://example.com/app.git"), [("compile", ["unit"])])?;
//! doc.add_pipeline("defaultGroup", pipeline)?;
//!
//! assert_eq!(doc.job_by_name("BUILD", "Compile", "UNIT")?.name.as_str(), "unit");
//! # Ok::<(), cruise_model::Error>(())
//! ```

pub mod artifact;
pub mod document;
pub mod environment;
pub mod error;
pub mod group;
pub mod job;
pub mod material;
pub mod name;
pub mod origin;
pub mod partial;
pub mod pipeline;
pub mod plugin;
pub mod property;
pub mod security;
pub mod server;
pub mod stage;
pub mod task;

pub use artifact::{ArtifactConfig, BuiltinArtifact, PluggableArtifact};
pub use document::{CURRENT_SCHEMA_VERSION, ConfigurationDocument};
pub use environment::EnvironmentConfig;
pub use error::{Error, Result};
pub use group::{PipelineGroup, Template};
pub use job::{Job, RunType, Tab};
pub use material::{
    DependencyMaterial, GitMaterial, HgMaterial, Material, P4Material, PackageMaterial, PluggableScmMaterial,
    ScmOptions, SvnMaterial, TfsMaterial,
};
pub use name::CaseInsensitiveString;
pub use origin::{Origin, RepoOrigin};
pub use partial::PartialConfig;
pub use pipeline::{LockBehavior, Param, Pipeline, Timer};
pub use plugin::{
    ArtifactStore, ClusterProfile, ConfigRepoConfig, ElasticConfig, ElasticProfile, PackageDefinition,
    PackageRepository, Scm, SecretConfig,
};
pub use property::{Configuration, ConfigurationProperty, EnvironmentVariable, EnvironmentVariables, PropertyValue};
pub use security::{
    Authorization, Permission, PluginRole, PolicyRule, Principal, Role, SecurityAuthConfig, SecurityConfig,
};
pub use server::{MailHost, PurgeSettings, ServerConfig};
pub use stage::{Approval, ApprovalType, Stage};
pub use task::{
    BuildTask, ExecArgs, ExecTask, FetchArtifactTask, FetchPluggableArtifactTask, FetchSource, NantTask,
    PathFromAncestor, PluggableTask, PluginConfiguration, RunIfCondition, Task, TaskKind,
};
