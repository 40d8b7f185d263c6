//! Plugin metadata used to decide which properties are secure

use std::collections::{HashMap, HashSet};

/// Read-only view of plugin metadata.
///
/// Injected wherever a property must be classified as secure or plain.
pub trait SecurePropertyLookup: Send + Sync {
    /// Whether metadata for `plugin_id` is available at all.
    fn has_metadata(&self, plugin_id: &str) -> bool;

    /// Whether `key` is declared secure by `plugin_id`.
    fn is_property_secure(&self, plugin_id: &str, key: &str) -> bool;

    /// Whether `key` takes part in the identity of a package or repository.
    /// Plugins without metadata treat every property as identity.
    fn is_part_of_identity(&self, _plugin_id: &str, _key: &str) -> bool {
        true
    }

    /// Resolve secure-ness, falling back to `explicit` when the plugin is unknown.
    fn resolve(&self, plugin_id: &str, key: &str, explicit: bool) -> bool {
        if self.has_metadata(plugin_id) {
            self.is_property_secure(plugin_id, key)
        } else {
            explicit
        }
    }
}

/// Lookup with no plugins loaded. Every property keeps its explicit flag.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPluginMetadata;

impl SecurePropertyLookup for NoPluginMetadata {
    fn has_metadata(&self, _plugin_id: &str) -> bool {
        false
    }

    fn is_property_secure(&self, _plugin_id: &str, _key: &str) -> bool {
        false
    }
}

/// In-memory metadata store keyed by plugin id.
#[derive(Debug, Default, Clone)]
pub struct PluginMetadataStore {
    plugins: HashMap<String, HashSet<String>>,
    non_identity: HashMap<String, HashSet<String>>,
}

impl PluginMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin and the property keys it declares secure.
    pub fn with_plugin<I, S>(mut self, plugin_id: impl Into<String>, secure_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins.insert(
            plugin_id.into(),
            secure_keys.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Mark property keys of `plugin_id` as not part of package identity.
    pub fn with_non_identity_keys<I, S>(mut self, plugin_id: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_identity
            .entry(plugin_id.into())
            .or_default()
            .extend(keys.into_iter().map(Into::into));
        self
    }
}

impl SecurePropertyLookup for PluginMetadataStore {
    fn has_metadata(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    fn is_property_secure(&self, plugin_id: &str, key: &str) -> bool {
        self.plugins
            .get(plugin_id)
            .is_some_and(|keys| keys.contains(key))
    }

    fn is_part_of_identity(&self, plugin_id: &str, key: &str) -> bool {
        !self
            .non_identity
            .get(plugin_id)
            .is_some_and(|keys| keys.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_plugin_falls_back_to_flag() {
        let store = PluginMetadataStore::new().with_plugin("docker", ["password"]);
        assert!(store.resolve("k8s", "token", true));
        assert!(!store.resolve("k8s", "token", false));
    }

    #[test]
    fn test_known_plugin_overrides_flag() {
        let store = PluginMetadataStore::new().with_plugin("docker", ["password"]);
        assert!(store.resolve("docker", "password", false));
        assert!(!store.resolve("docker", "image", true));
    }

    #[test]
    fn test_identity_keys() {
        let store = PluginMetadataStore::new().with_non_identity_keys("yum", ["POLL_VERSION_FROM"]);
        assert!(store.is_part_of_identity("yum", "PACKAGE_SPEC"));
        assert!(!store.is_part_of_identity("yum", "POLL_VERSION_FROM"));
        assert!(NoPluginMetadata.is_part_of_identity("yum", "POLL_VERSION_FROM"));
    }

    #[test]
    fn test_no_metadata() {
        assert!(NoPluginMetadata.resolve("any", "key", true));
        assert!(!NoPluginMetadata.resolve("any", "key", false));
    }
}
