//! Key material for the current and legacy ciphers

use crate::{Error, Result};
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// Built-in key of the legacy cipher. Historical documents were encrypted with it.
pub const DEFAULT_DES_KEY_HEX: &str = "269298bc31c44620";

/// 128-bit key of the current cipher.
#[derive(Clone, PartialEq, Eq)]
pub struct AesKey([u8; 16]);

/// 64-bit key of the legacy cipher.
#[derive(Clone, PartialEq, Eq)]
pub struct DesKey([u8; 8]);

impl AesKey {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded key, ignoring surrounding whitespace.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| Error::invalid_key("AES", e.to_string()))?;
        let bytes: [u8; 16] = bytes.try_into().map_err(|b: Vec<u8>| {
            Error::invalid_key("AES", format!("expected 16 bytes, got {}", b.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_hex(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_hex()).map_err(|e| Error::io(path, e))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl DesKey {
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| Error::invalid_key("DES", e.to_string()))?;
        let bytes: [u8; 8] = bytes.try_into().map_err(|b: Vec<u8>| {
            Error::invalid_key("DES", format!("expected 8 bytes, got {}", b.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Load the key from `path`, or fall back to the built-in key when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Legacy key file not found, using built-in key");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_hex(&content)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for DesKey {
    fn default() -> Self {
        Self([0x26, 0x92, 0x98, 0xbc, 0x31, 0xc4, 0x46, 0x20])
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesKey(..)")
    }
}

impl fmt::Debug for DesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DesKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_des_key_matches_hex() {
        assert_eq!(DesKey::from_hex(DEFAULT_DES_KEY_HEX).unwrap(), DesKey::default());
    }

    #[test]
    fn test_aes_key_hex_roundtrip() {
        let key = AesKey::generate();
        assert_eq!(AesKey::from_hex(&key.to_hex()).unwrap(), key);
    }

    #[test]
    fn test_aes_key_wrong_length() {
        let err = AesKey::from_hex("abcd").unwrap_err();
        assert!(err.to_string().contains("expected 16 bytes"));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let key = AesKey::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();
        assert_eq!(format!("{:?}", key), "AesKey(..)");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cipher.aes");
        let key = AesKey::generate();
        key.save(&path).unwrap();
        assert_eq!(AesKey::load(&path).unwrap(), key);
    }

    #[test]
    fn test_missing_des_file_uses_default() {
        let dir = TempDir::new().unwrap();
        let key = DesKey::load_or_default(&dir.path().join("cipher")).unwrap();
        assert_eq!(key, DesKey::default());
    }
}
