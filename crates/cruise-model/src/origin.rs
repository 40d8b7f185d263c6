//! Provenance of configuration entities

use serde::Serialize;
use std::fmt;

/// Where an entity came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Origin {
    /// The primary configuration file.
    #[default]
    File,
    /// A fragment pulled from a config repository.
    Repo(RepoOrigin),
    /// A merge of the file and one or more fragments.
    Merge,
}

/// A config repository revision a fragment was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoOrigin {
    /// Fingerprint of the config repository's source material.
    pub fingerprint: String,
    pub config_repo_id: Option<String>,
    pub revision: Option<String>,
}

impl RepoOrigin {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            config_repo_id: None,
            revision: None,
        }
    }

    pub fn with_repo_id(mut self, id: impl Into<String>) -> Self {
        self.config_repo_id = Some(id.into());
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }
}

impl Origin {
    /// Entities from the primary file may be edited interactively.
    pub fn is_local(&self) -> bool {
        matches!(self, Origin::File)
    }

    pub fn is_repo(&self) -> bool {
        matches!(self, Origin::Repo(_))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File => f.write_str("cruise-config.xml"),
            Origin::Repo(repo) => {
                let id = repo.config_repo_id.as_deref().unwrap_or(&repo.fingerprint);
                match &repo.revision {
                    Some(rev) => write!(f, "{} at revision {}", id, rev),
                    None => write!(f, "{}", id),
                }
            }
            Origin::Merge => f.write_str("merged configuration"),
        }
    }
}
