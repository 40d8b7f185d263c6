//! Materials: the sources a pipeline is triggered by

use crate::{CaseInsensitiveString, PropertyValue};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Settings shared by every source-control material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScmOptions {
    /// Checkout sub-directory inside the pipeline working directory.
    pub dest: Option<String>,
    pub name: Option<CaseInsensitiveString>,
    pub auto_update: bool,
    /// Ignore patterns of the modification filter.
    pub filter: Vec<String>,
    pub invert_filter: bool,
}

impl Default for ScmOptions {
    fn default() -> Self {
        Self {
            dest: None,
            name: None,
            auto_update: true,
            filter: Vec::new(),
            invert_filter: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SvnMaterial {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<PropertyValue>,
    pub check_externals: bool,
    pub options: ScmOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitMaterial {
    pub url: String,
    pub branch: String,
    pub shallow_clone: bool,
    pub options: ScmOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HgMaterial {
    pub url: String,
    pub branch: Option<String>,
    pub options: ScmOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct P4Material {
    pub server_and_port: String,
    pub username: Option<String>,
    pub password: Option<PropertyValue>,
    pub use_tickets: bool,
    pub view: String,
    pub options: ScmOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TfsMaterial {
    pub url: String,
    pub username: String,
    pub domain: Option<String>,
    pub password: Option<PropertyValue>,
    pub project_path: String,
    pub options: ScmOptions,
}

/// Dependency on a stage of an upstream pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyMaterial {
    pub name: Option<CaseInsensitiveString>,
    pub pipeline: CaseInsensitiveString,
    pub stage: CaseInsensitiveString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMaterial {
    pub package_id: String,
}

/// Reference to a plugin-backed SCM defined at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluggableScmMaterial {
    pub scm_id: String,
    pub options: ScmOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Material {
    Svn(SvnMaterial),
    Git(GitMaterial),
    Hg(HgMaterial),
    P4(P4Material),
    Tfs(TfsMaterial),
    Dependency(DependencyMaterial),
    Package(PackageMaterial),
    PluggableScm(PluggableScmMaterial),
}

impl GitMaterial {
    pub const DEFAULT_BRANCH: &'static str = "master";

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: Self::DEFAULT_BRANCH.to_string(),
            shallow_clone: false,
            options: ScmOptions::default(),
        }
    }
}

impl SvnMaterial {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            check_externals: false,
            options: ScmOptions::default(),
        }
    }
}

impl HgMaterial {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: None,
            options: ScmOptions::default(),
        }
    }
}

impl DependencyMaterial {
    pub fn new(pipeline: impl Into<CaseInsensitiveString>, stage: impl Into<CaseInsensitiveString>) -> Self {
        Self {
            name: None,
            pipeline: pipeline.into(),
            stage: stage.into(),
        }
    }
}

impl Material {
    pub fn git(url: impl Into<String>) -> Self {
        Material::Git(GitMaterial::new(url))
    }

    pub fn svn(url: impl Into<String>) -> Self {
        Material::Svn(SvnMaterial::new(url))
    }

    pub fn hg(url: impl Into<String>) -> Self {
        Material::Hg(HgMaterial::new(url))
    }

    pub fn dependency(pipeline: impl Into<CaseInsensitiveString>, stage: impl Into<CaseInsensitiveString>) -> Self {
        Material::Dependency(DependencyMaterial::new(pipeline, stage))
    }

    /// Human-readable type, as used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Material::Svn(_) => "Subversion",
            Material::Git(_) => "Git",
            Material::Hg(_) => "Mercurial",
            Material::P4(_) => "Perforce",
            Material::Tfs(_) => "Tfs",
            Material::Dependency(_) => "Pipeline",
            Material::Package(_) => "Package",
            Material::PluggableScm(_) => "SCM",
        }
    }

    /// Location shown next to the type in messages.
    pub fn location(&self) -> String {
        match self {
            Material::Svn(m) => m.url.clone(),
            Material::Git(m) => m.url.clone(),
            Material::Hg(m) => m.url.clone(),
            Material::P4(m) => m.server_and_port.clone(),
            Material::Tfs(m) => m.url.clone(),
            Material::Dependency(m) => format!("{} [{}]", m.pipeline, m.stage),
            Material::Package(m) => m.package_id.clone(),
            Material::PluggableScm(m) => m.scm_id.clone(),
        }
    }

    /// Explicit material name, falling back to the location.
    pub fn display_name(&self) -> String {
        let explicit = match self {
            Material::Dependency(m) => m.name.as_ref().or(Some(&m.pipeline)),
            _ => self.options().and_then(|o| o.name.as_ref()),
        };
        explicit
            .map(|n| n.to_string())
            .unwrap_or_else(|| self.location())
    }

    pub fn options(&self) -> Option<&ScmOptions> {
        match self {
            Material::Svn(m) => Some(&m.options),
            Material::Git(m) => Some(&m.options),
            Material::Hg(m) => Some(&m.options),
            Material::P4(m) => Some(&m.options),
            Material::Tfs(m) => Some(&m.options),
            Material::PluggableScm(m) => Some(&m.options),
            Material::Dependency(_) | Material::Package(_) => None,
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut ScmOptions> {
        match self {
            Material::Svn(m) => Some(&mut m.options),
            Material::Git(m) => Some(&mut m.options),
            Material::Hg(m) => Some(&mut m.options),
            Material::P4(m) => Some(&mut m.options),
            Material::Tfs(m) => Some(&mut m.options),
            Material::PluggableScm(m) => Some(&mut m.options),
            Material::Dependency(_) | Material::Package(_) => None,
        }
    }

    /// Source-control materials that check out into the working directory.
    pub fn is_scm(&self) -> bool {
        self.options().is_some()
    }

    pub fn dest(&self) -> Option<&str> {
        self.options().and_then(|o| o.dest.as_deref())
    }

    /// Auto-update flag of built-in SCM materials. Pluggable SCMs carry theirs
    /// on the SCM definition, dependencies and packages have none.
    pub fn auto_update(&self) -> Option<bool> {
        match self {
            Material::PluggableScm(_) => None,
            _ => self.options().map(|o| o.auto_update),
        }
    }

    pub fn password(&self) -> Option<&PropertyValue> {
        match self {
            Material::Svn(m) => m.password.as_ref(),
            Material::P4(m) => m.password.as_ref(),
            Material::Tfs(m) => m.password.as_ref(),
            _ => None,
        }
    }

    /// Stable identity of the material.
    ///
    /// Only identity-relevant fields take part: destination, name, filter and
    /// auto-update do not, so two pipelines using the same repository share
    /// a fingerprint even if they check out to different places.
    pub fn fingerprint(&self) -> String {
        let fields: Vec<(&str, String)> = match self {
            Material::Svn(m) => vec![
                ("url", m.url.clone()),
                ("username", m.username.clone().unwrap_or_default()),
                ("checkExternals", m.check_externals.to_string()),
            ],
            Material::Git(m) => vec![("url", m.url.clone()), ("branch", m.branch.clone())],
            Material::Hg(m) => vec![
                ("url", m.url.clone()),
                ("branch", m.branch.clone().unwrap_or_default()),
            ],
            Material::P4(m) => vec![
                ("serverAndPort", m.server_and_port.clone()),
                ("userName", m.username.clone().unwrap_or_default()),
                ("view", m.view.trim().to_string()),
            ],
            Material::Tfs(m) => vec![
                ("url", m.url.clone()),
                ("domain", m.domain.clone().unwrap_or_default()),
                ("username", m.username.clone()),
                ("projectPath", m.project_path.clone()),
            ],
            Material::Dependency(m) => vec![
                ("pipelineName", m.pipeline.key().to_string()),
                ("stageName", m.stage.key().to_string()),
            ],
            Material::Package(m) => vec![("packageId", m.package_id.clone())],
            Material::PluggableScm(m) => vec![("scmId", m.scm_id.clone())],
        };

        let mut hasher = Sha256::new();
        hasher.update(self.type_name().as_bytes());
        for (key, value) in fields {
            hasher.update(b"<|>");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}
