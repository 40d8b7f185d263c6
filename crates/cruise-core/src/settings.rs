//! Engine settings
//!
//! Settings are read from TOML. Discovery order:
//!
//! 1. An explicit path (`--settings`)
//! 2. `cruise.toml` in the working directory
//! 3. `cruise/cruise.toml` in the user config directory
//! 4. Built-in defaults
//!
//! ```
//! use cruise_core::EngineSettings;
//!
//! let settings = EngineSettings::from_toml("[validation]\nallow_invalid_for_edit = false\n").unwrap();
//! assert!(!settings.validation.allow_invalid_for_edit);
//! assert!(settings.backup.enabled);
//! ```

use crate::{Error, Result};
use cruise_secure::{AesKey, DesKey, SecureCipher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SETTINGS_FILE: &str = "cruise.toml";
pub const AES_KEY_FILE: &str = "cipher.aes";
pub const DES_KEY_FILE: &str = "cipher";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub cipher: CipherSettings,
    pub validation: ValidationSettings,
    pub backup: BackupSettings,
}

/// Key file locations. Unset paths default to files next to the config document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherSettings {
    pub aes_key_file: Option<PathBuf>,
    pub des_key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Whether the editable form may be returned alongside validation errors.
    pub allow_invalid_for_edit: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            allow_invalid_for_edit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    pub enabled: bool,
    /// Defaults to `backups/` next to the config document.
    pub directory: Option<PathBuf>,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

impl EngineSettings {
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Find and load settings. Returns the settings and the file they came from.
    pub fn discover(explicit: Option<&Path>, working_dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let candidates = [
            Some(working_dir.join(SETTINGS_FILE)),
            dirs::config_dir().map(|d| d.join("cruise").join(SETTINGS_FILE)),
        ];
        for candidate in candidates.into_iter().flatten() {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "Loading engine settings");
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    pub fn aes_key_path(&self, config_path: &Path) -> PathBuf {
        self.cipher
            .aes_key_file
            .clone()
            .unwrap_or_else(|| sibling(config_path, AES_KEY_FILE))
    }

    pub fn des_key_path(&self, config_path: &Path) -> PathBuf {
        self.cipher
            .des_key_file
            .clone()
            .unwrap_or_else(|| sibling(config_path, DES_KEY_FILE))
    }

    pub fn backup_dir(&self, config_path: &Path) -> PathBuf {
        self.backup
            .directory
            .clone()
            .unwrap_or_else(|| sibling(config_path, "backups"))
    }

    /// Build the cipher for documents at `config_path`.
    ///
    /// A missing AES key file is created with a fresh key. A missing legacy key
    /// file falls back to the built-in legacy key.
    pub fn cipher(&self, config_path: &Path) -> Result<SecureCipher> {
        let aes_path = self.aes_key_path(config_path);
        let aes = if aes_path.exists() {
            AesKey::load(&aes_path)?
        } else {
            let key = AesKey::generate();
            if let Some(parent) = aes_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            key.save(&aes_path)?;
            info!(path = %aes_path.display(), "Generated a new AES key");
            key
        };
        let des = DesKey::load_or_default(&self.des_key_path(config_path))?;
        Ok(SecureCipher::new(aes, des))
    }
}

fn sibling(config_path: &Path, name: &str) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}
