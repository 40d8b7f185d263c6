//! [`TestWorkspace`]: a temporary directory for file-based tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fixed AES key used by workspace fixtures.
pub const TEST_AES_KEY_HEX: &str = "00112233445566778899aabbccddeeff";

/// A temporary directory holding a config file and, optionally, key files
/// and engine settings.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestWorkspace::write: failed to write {}: {e}", path.display()));
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("TestWorkspace::read: failed to read {relative}: {e}"))
    }

    /// Write `cruise-config.xml` and return its path.
    pub fn config(&self, content: &str) -> PathBuf {
        self.write("cruise-config.xml", content)
    }

    /// Write the AES key file next to the config and a `cruise.toml` pointing at it.
    pub fn with_keys(&self) -> PathBuf {
        self.write("cipher.aes", TEST_AES_KEY_HEX);
        let settings = format!(
            "[cipher]\naes_key_file = \"{}\"\n\n[backup]\ndirectory = \"{}\"\n",
            self.path("cipher.aes").display().to_string().replace('\\', "/"),
            self.path("backups").display().to_string().replace('\\', "/"),
        );
        self.write("cruise.toml", &settings)
    }

    /// Files directly inside `relative`, sorted by name.
    pub fn list(&self, relative: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.path(relative)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
