//! Encryption of plugin properties declared secure by plugin metadata

use crate::Result;
use cruise_model::{ArtifactConfig, Configuration, ConfigurationDocument, PropertyValue, TaskKind};
use cruise_secure::{SecureCipher, SecurePropertyLookup};
use std::collections::HashMap;
use tracing::debug;

/// Encrypt every plain plugin property whose key the plugin declares secure.
///
/// Returns the number of properties encrypted. Plugins without metadata are
/// left alone: their properties keep the secure flag they were written with.
pub fn encrypt_secure_properties(
    doc: &mut ConfigurationDocument,
    lookup: &dyn SecurePropertyLookup,
    cipher: &SecureCipher,
) -> Result<usize> {
    let store_plugins: HashMap<String, String> = doc
        .artifact_stores
        .iter()
        .map(|store| (store.id.clone(), store.plugin_id.clone()))
        .collect();
    let auth_plugins: HashMap<String, String> = doc
        .server
        .security
        .auth_configs
        .iter()
        .map(|config| (config.id.clone(), config.plugin_id.clone()))
        .collect();
    let mut count = 0;
    let mut visit = |plugin_id: &str, configuration: &mut Configuration| -> Result<()> {
        for property in configuration.iter_mut() {
            let PropertyValue::Plain(plaintext) = &property.value else {
                continue;
            };
            if lookup.resolve(plugin_id, &property.key, false) {
                let encrypted = PropertyValue::secure(plaintext, cipher)?;
                property.value = encrypted;
                count += 1;
            }
        }
        Ok(())
    };

    let security = &mut doc.server.security;
    for config in &mut security.auth_configs {
        visit(&config.plugin_id, &mut config.configuration)?;
    }
    for role in &mut security.plugin_roles {
        if let Some(plugin_id) = auth_plugins.get(&role.auth_config_id) {
            visit(plugin_id, &mut role.configuration)?;
        }
    }
    for config in &mut doc.secret_configs {
        visit(&config.plugin_id, &mut config.configuration)?;
    }
    for store in &mut doc.artifact_stores {
        visit(&store.plugin_id, &mut store.configuration)?;
    }
    for cluster in &mut doc.elastic.cluster_profiles {
        visit(&cluster.plugin_id, &mut cluster.configuration)?;
    }
    for profile in &mut doc.elastic.profiles {
        visit(&profile.plugin_id, &mut profile.configuration)?;
    }
    for repo in &mut doc.config_repos {
        visit(&repo.plugin_id, &mut repo.configuration)?;
    }
    for repository in &mut doc.repositories {
        let plugin_id = repository.plugin.id.clone();
        visit(&plugin_id, &mut repository.configuration)?;
        for package in &mut repository.packages {
            visit(&plugin_id, &mut package.configuration)?;
        }
    }
    for scm in &mut doc.scms {
        visit(&scm.plugin.id, &mut scm.configuration)?;
    }
    for pipeline in doc.all_pipelines_mut() {
        for stage in pipeline.stages_mut() {
            for job in stage.jobs_mut() {
                for task in job.tasks_mut() {
                    if let TaskKind::Pluggable(plugin) = &mut task.kind {
                        visit(&plugin.plugin.id, &mut plugin.configuration)?;
                    }
                }
                for artifact in job.artifacts_mut() {
                    let ArtifactConfig::External(external) = artifact else {
                        continue;
                    };
                    if let Some(plugin_id) = store_plugins.get(&external.store_id) {
                        visit(plugin_id, &mut external.configuration)?;
                    }
                }
            }
        }
    }

    debug!(count, "Encrypted secure plugin properties");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cruise_model::{ArtifactStore, ConfigurationProperty, PluginRole, SecretConfig, SecurityAuthConfig};
    use cruise_secure::{AesKey, PluginMetadataStore};

    #[test]
    fn test_only_declared_keys_are_encrypted() {
        let cipher = SecureCipher::with_aes_key(AesKey::from_bytes([7; 16]));
        let lookup = PluginMetadataStore::new().with_plugin("cd.docker", ["password"]);
        let mut doc = ConfigurationDocument::new();
        doc.artifact_stores.push(ArtifactStore {
            id: "hub".into(),
            plugin_id: "cd.docker".into(),
            configuration: Configuration::from_properties([
                ConfigurationProperty::plain("username", "ci"),
                ConfigurationProperty::plain("password", "hunter2"),
            ])
            .unwrap(),
        });
        doc.secret_configs.push(SecretConfig {
            id: "vault".into(),
            plugin_id: "cd.vault".into(),
            description: None,
            configuration: Configuration::from_properties([ConfigurationProperty::plain("token", "t")]).unwrap(),
            rules: Vec::new(),
        });

        assert_eq!(encrypt_secure_properties(&mut doc, &lookup, &cipher).unwrap(), 1);

        let store = &doc.artifact_stores[0].configuration;
        assert!(!store.get("username").unwrap().is_secure());
        let password = &store.get("password").unwrap().value;
        assert!(password.is_secure());
        assert_eq!(password.plaintext(&cipher).unwrap(), "hunter2");
        assert!(!doc.secret_configs[0].configuration.get("token").unwrap().is_secure());
    }

    #[test]
    fn test_plugin_role_uses_plugin_of_its_auth_config() {
        let cipher = SecureCipher::with_aes_key(AesKey::from_bytes([7; 16]));
        let lookup = PluginMetadataStore::new().with_plugin("cd.go.github", ["k1", "k3"]);
        let mut doc = ConfigurationDocument::new();
        let security = &mut doc.server.security;
        security.auth_configs.push(SecurityAuthConfig::new("auth_config_id", "cd.go.github"));
        let mut role = PluginRole::new("admin", "auth_config_id");
        role.configuration = Configuration::from_properties([
            ConfigurationProperty::plain("k1", "pub_v1"),
            ConfigurationProperty::plain("k2", "pub_v2"),
            ConfigurationProperty::plain("k3", "pub_v3"),
        ])
        .unwrap();
        security.plugin_roles.push(role.clone());
        let mut orphan = role;
        orphan.name = "orphan".into();
        orphan.auth_config_id = "missing".into();
        security.plugin_roles.push(orphan);

        assert_eq!(encrypt_secure_properties(&mut doc, &lookup, &cipher).unwrap(), 2);

        let roles = &doc.server.security.plugin_roles;
        let secure: Vec<bool> = roles[0].configuration.iter().map(|p| p.is_secure()).collect();
        assert_eq!(secure, [true, false, true]);
        assert_eq!(roles[0].configuration.get("k1").unwrap().value.plaintext(&cipher).unwrap(), "pub_v1");
        assert!(roles[1].configuration.iter().all(|p| !p.is_secure()));
    }
}
