//! Configuration properties and environment variables

use crate::{CaseInsensitiveString, Error, Result};
use cruise_secure::{SecureCipher, SecurePropertyLookup};
use serde::Serialize;

/// A value that is either stored in plain text or only as a ciphertext token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Plain(String),
    Encrypted(String),
}

impl PropertyValue {
    /// Encrypt `plaintext` into a secure value.
    pub fn secure(plaintext: &str, cipher: &SecureCipher) -> Result<Self> {
        Ok(Self::Encrypted(cipher.encrypt(plaintext)?))
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, PropertyValue::Encrypted(_))
    }

    /// The stored text: plain value or ciphertext token.
    pub fn raw(&self) -> &str {
        match self {
            PropertyValue::Plain(v) | PropertyValue::Encrypted(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    /// Plaintext of the value, decrypting when needed.
    pub fn plaintext(&self, cipher: &SecureCipher) -> Result<String> {
        match self {
            PropertyValue::Plain(v) => Ok(v.clone()),
            PropertyValue::Encrypted(token) if token.is_empty() => Ok(String::new()),
            PropertyValue::Encrypted(token) => Ok(cipher.decrypt(token)?),
        }
    }

    /// Compare by plaintext. Tokens of equal secrets differ, so they are decrypted first.
    pub fn same_value(&self, other: &Self, cipher: &SecureCipher) -> Result<bool> {
        Ok(self.plaintext(cipher)? == other.plaintext(cipher)?)
    }
}

/// A key/value pair of plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationProperty {
    pub key: String,
    pub value: PropertyValue,
}

impl ConfigurationProperty {
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue::Plain(value.into()),
        }
    }

    pub fn encrypted(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue::Encrypted(token.into()),
        }
    }

    /// Build a property from user input, encrypting it when the plugin declares
    /// the key secure. `explicit_secure` applies when no metadata is known.
    pub fn with_metadata(
        key: impl Into<String>,
        plaintext: &str,
        plugin_id: &str,
        explicit_secure: bool,
        metadata: &dyn SecurePropertyLookup,
        cipher: &SecureCipher,
    ) -> Result<Self> {
        let key = key.into();
        let value = if metadata.resolve(plugin_id, &key, explicit_secure) {
            PropertyValue::secure(plaintext, cipher)?
        } else {
            PropertyValue::Plain(plaintext.to_string())
        };
        Ok(Self { key, value })
    }

    pub fn is_secure(&self) -> bool {
        self.value.is_secure()
    }
}

/// Ordered list of properties with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Configuration(Vec<ConfigurationProperty>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_properties(properties: impl IntoIterator<Item = ConfigurationProperty>) -> Result<Self> {
        let mut config = Self::new();
        for property in properties {
            config.add(property)?;
        }
        Ok(config)
    }

    pub fn add(&mut self, property: ConfigurationProperty) -> Result<()> {
        if self.get(&property.key).is_some() {
            return Err(Error::DuplicateProperty { key: property.key });
        }
        self.0.push(property);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigurationProperty> {
        self.0.iter().find(|p| p.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationProperty> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConfigurationProperty> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named environment variable, plain or secure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentVariable {
    pub name: CaseInsensitiveString,
    pub value: PropertyValue,
}

impl EnvironmentVariable {
    pub fn plain(name: impl Into<CaseInsensitiveString>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Plain(value.into()),
        }
    }

    pub fn encrypted(name: impl Into<CaseInsensitiveString>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Encrypted(token.into()),
        }
    }

    /// Encrypt `plaintext` and keep only the token.
    pub fn secure(name: impl Into<CaseInsensitiveString>, plaintext: &str, cipher: &SecureCipher) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            value: PropertyValue::secure(plaintext, cipher)?,
        })
    }

    pub fn is_secure(&self) -> bool {
        self.value.is_secure()
    }
}

/// Ordered variables with case-insensitively unique names.
///
/// Owners (job, stage, pipeline, environment) add through their own
/// `add_variable` so the error can name the scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvironmentVariables(Vec<EnvironmentVariable>);

impl EnvironmentVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&EnvironmentVariable> {
        self.0.iter().find(|v| v.name.matches(name))
    }

    pub fn contains(&self, name: &CaseInsensitiveString) -> bool {
        self.0.iter().any(|v| &v.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvironmentVariable> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EnvironmentVariable> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert `variable`, reporting a collision against `scope` (e.g. `pipeline 'build'`).
    pub(crate) fn insert(&mut self, variable: EnvironmentVariable, label: &str, scope: String) -> Result<()> {
        if self.contains(&variable.name) {
            return Err(Error::not_unique(label, variable.name.as_str(), scope));
        }
        self.0.push(variable);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cruise_secure::{AesKey, NoPluginMetadata, PluginMetadataStore};

    fn cipher() -> SecureCipher {
        SecureCipher::with_aes_key(AesKey::from_hex("00112233445566778899aabbccddeeff").unwrap())
    }

    #[test]
    fn test_secure_variable_keeps_only_token() {
        let var = EnvironmentVariable::secure("PASSWORD", "hunter2", &cipher()).unwrap();
        assert!(var.is_secure());
        assert!(var.value.raw().starts_with("AES:"));
        assert!(!format!("{:?}", var).contains("hunter2"));
        assert_eq!(var.value.plaintext(&cipher()).unwrap(), "hunter2");
    }

    #[test]
    fn test_property_uses_plugin_metadata() {
        let store = PluginMetadataStore::new().with_plugin("docker", ["password"]);
        let c = cipher();
        let secure = ConfigurationProperty::with_metadata("password", "pw", "docker", false, &store, &c).unwrap();
        let plain = ConfigurationProperty::with_metadata("image", "alpine", "docker", true, &store, &c).unwrap();
        assert!(secure.is_secure());
        assert!(!plain.is_secure());

        let fallback = ConfigurationProperty::with_metadata("token", "t", "unknown", true, &NoPluginMetadata, &c).unwrap();
        assert!(fallback.is_secure());
    }

    #[test]
    fn test_configuration_rejects_duplicate_keys() {
        let mut config = Configuration::new();
        config.add(ConfigurationProperty::plain("url", "a")).unwrap();
        let err = config.add(ConfigurationProperty::plain("url", "b")).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate key 'url' found in configuration.");
    }

    #[test]
    fn test_same_value_decrypts() {
        let c = cipher();
        let a = PropertyValue::secure("x", &c).unwrap();
        let b = PropertyValue::secure("x", &c).unwrap();
        assert_ne!(a, b);
        assert!(a.same_value(&b, &c).unwrap());
    }
}
