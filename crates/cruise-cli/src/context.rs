//! Settings and key material shared by every command

use crate::error::Result;
use cruise_core::{BackupManager, ConfigLoader, EngineSettings};
use cruise_secure::SecureCipher;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name, used to locate keys when no file is given.
const DEFAULT_CONFIG_FILE: &str = "cruise-config.xml";

pub struct CliContext {
    pub settings: EngineSettings,
    working_dir: PathBuf,
}

impl CliContext {
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let working_dir = std::env::current_dir()?;
        let (settings, source) = EngineSettings::discover(explicit, &working_dir)?;
        match &source {
            Some(path) => debug!(path = %path.display(), "Using engine settings"),
            None => debug!("Using default engine settings"),
        }
        Ok(Self { settings, working_dir })
    }

    /// Cipher for the document at `config_path`, or for the working directory.
    pub fn cipher(&self, config_path: Option<&Path>) -> Result<SecureCipher> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => self.working_dir.join(DEFAULT_CONFIG_FILE),
        };
        Ok(self.settings.cipher(&path)?)
    }

    pub fn loader<'a>(&self, cipher: &'a SecureCipher) -> ConfigLoader<'a> {
        ConfigLoader::new(cipher).allow_invalid_for_edit(self.settings.validation.allow_invalid_for_edit)
    }

    /// Backup manager for `config_path`, or `None` when backups are disabled.
    pub fn backups(&self, config_path: &Path) -> Option<BackupManager> {
        self.settings
            .backup
            .enabled
            .then(|| BackupManager::new(self.settings.backup_dir(config_path)))
    }
}
