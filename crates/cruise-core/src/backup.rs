//! Timestamped copies of configuration files taken before they are overwritten

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// A backup written by [`BackupManager::create_backup`]
#[derive(Debug, Clone)]
pub struct ConfigBackup {
    /// The file that was copied
    pub source: PathBuf,
    /// Location of the copy
    pub path: PathBuf,
    pub created: DateTime<Utc>,
}

/// Manages configuration backups in a single directory
#[derive(Debug, Clone)]
pub struct BackupManager {
    backups_dir: PathBuf,
}

impl BackupManager {
    pub fn new(backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            backups_dir: backups_dir.into(),
        }
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Copy `source` to `{file name}.{timestamp}.bak` in the backup directory.
    pub fn create_backup(&self, source: &Path) -> Result<ConfigBackup> {
        let created = Utc::now();
        let file_name = Self::file_name(source)?;
        fs::create_dir_all(&self.backups_dir).map_err(|e| Error::io(&self.backups_dir, e))?;

        let path = self
            .backups_dir
            .join(format!("{}.{}.bak", file_name, created.format(TIMESTAMP_FORMAT)));
        fs::copy(source, &path).map_err(|e| Error::io(source, e))?;

        info!(source = %source.display(), backup = %path.display(), "Created backup");
        Ok(ConfigBackup {
            source: source.to_path_buf(),
            path,
            created,
        })
    }

    /// Backups of `source`, oldest first
    pub fn list_backups(&self, source: &Path) -> Result<Vec<PathBuf>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}.", Self::file_name(source)?);
        let entries = fs::read_dir(&self.backups_dir).map_err(|e| Error::io(&self.backups_dir, e))?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.backups_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".bak") {
                backups.push(entry.path());
            }
        }
        // The timestamp format sorts lexically.
        backups.sort();
        Ok(backups)
    }

    fn file_name(source: &Path) -> Result<String> {
        source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::io(source, std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path")))
    }
}
