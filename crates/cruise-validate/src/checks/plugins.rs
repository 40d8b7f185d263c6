//! Plugin entities: elastic clusters, package identity, secret references.

use super::Context;
use crate::error::{Report, path};
use cruise_model::{EnvironmentVariables, PropertyValue};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

static SECRET_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{SECRET:\[(.*?)\]\[(.*?)\]\}\}").unwrap());

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    clusters(ctx, report);
    packages(ctx, report);
    secrets(ctx, report);
}

fn clusters(ctx: &Context<'_>, report: &mut Report) {
    let elastic = &ctx.doc.elastic;
    for profile in &elastic.profiles {
        if elastic.cluster_profile(&profile.cluster_profile_id).is_none() {
            report.add(
                path(&[("elastic-profile", &profile.id)]),
                format!(
                    "No cluster profile defined corresponding to cluster_profile_id '{}'",
                    profile.cluster_profile_id
                ),
            );
        }
    }
}

/// Packages whose identity-marked properties collide, across all repositories.
fn packages(ctx: &Context<'_>, report: &mut Report) {
    let mut by_identity: Vec<(String, Vec<(&str, &str)>)> = Vec::new();
    for repository in &ctx.doc.repositories {
        for package in &repository.packages {
            let identity = repository.package_identity(package, ctx.lookup);
            let entry = (repository.name.as_str(), package.name.as_str());
            match by_identity.iter_mut().find(|(i, _)| *i == identity) {
                Some((_, list)) => list.push(entry),
                None => by_identity.push((identity, vec![entry])),
            }
        }
    }

    let duplicates: Vec<String> = by_identity
        .iter()
        .filter(|(_, list)| list.len() > 1)
        .flat_map(|(_, list)| list)
        .map(|(repo, package)| format!("[Repo Name: '{repo}', Package Name: '{package}']"))
        .collect();
    if !duplicates.is_empty() {
        report.add(
            "repositories",
            format!(
                "Cannot save package or repo, found duplicate packages. {}",
                duplicates.join(", ")
            ),
        );
    }
}

/// `{{SECRET:[id][key]}}` references in variable values.
///
/// Pipeline-level scopes are checked as the owning pipeline group, environments
/// as themselves.
fn secrets(ctx: &Context<'_>, report: &mut Report) {
    let doc = ctx.doc;
    let mut scopes: Vec<(String, &str, &str, &EnvironmentVariables)> = Vec::new();
    for group in &doc.groups {
        for pipeline in group.pipelines() {
            let owner = group.name.as_str();
            scopes.push((path(&[("pipeline", pipeline.name.as_str())]), "pipeline_group", owner, pipeline.variables()));
            for stage in pipeline.stages() {
                let at = path(&[("pipeline", pipeline.name.as_str()), ("stage", stage.name.as_str())]);
                scopes.push((at, "pipeline_group", owner, stage.variables()));
                for job in stage.jobs() {
                    let at = path(&[
                        ("pipeline", pipeline.name.as_str()),
                        ("stage", stage.name.as_str()),
                        ("job", job.name.as_str()),
                    ]);
                    scopes.push((at, "pipeline_group", owner, job.variables()));
                }
            }
        }
    }
    for environment in &doc.environments {
        let at = path(&[("environment", environment.name.as_str())]);
        scopes.push((at, "environment", environment.name.as_str(), environment.variables()));
    }

    let mut unknown: HashMap<&str, usize> = HashMap::new();
    for (at, entity_type, entity, variables) in scopes {
        for variable in variables.iter() {
            let PropertyValue::Plain(value) = &variable.value else {
                continue;
            };
            for reference in SECRET_REFERENCE.captures_iter(value) {
                let id = reference.get(1).map_or("", |m| m.as_str());
                match doc.secret_config(id) {
                    None => {
                        *unknown.entry(id).or_default() += 1;
                        report.add(at.clone(), format!("Secret config with id '{id}' does not exist"));
                    }
                    Some(config) if !config.can_be_referred_by(entity_type, entity) => report.add(
                        at.clone(),
                        format!(
                            "{} '{}' does not have permission to refer to secrets using secret config '{}'",
                            if entity_type == "environment" { "Environment" } else { "Pipeline group" },
                            entity,
                            id
                        ),
                    ),
                    Some(_) => {}
                }
            }
        }
    }
    for (id, count) in unknown {
        warn!(secret_config = id, references = count, "Variables refer to an undefined secret config");
    }
}

#[cfg(test)]
mod tests {
    use crate::{Validator, validate};
    use cruise_model::{
        ClusterProfile, Configuration, ConfigurationDocument, ConfigurationProperty, ElasticProfile,
        EnvironmentConfig, EnvironmentVariable, Material, PackageDefinition, PackageRepository, Pipeline,
        PluginConfiguration, PolicyRule, SecretConfig,
    };
    use cruise_secure::PluginMetadataStore;
    use pretty_assertions::assert_eq;

    fn messages(doc: &ConfigurationDocument) -> Vec<String> {
        validate(doc).into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_elastic_profile_needs_cluster() {
        let mut doc = ConfigurationDocument::new();
        doc.elastic.cluster_profiles.push(ClusterProfile {
            id: "k8s".into(),
            plugin_id: "cd.elastic".into(),
            configuration: Configuration::new(),
        });
        for (id, cluster) in [("small", "k8s"), ("large", "ecs")] {
            doc.elastic.profiles.push(ElasticProfile {
                id: id.into(),
                cluster_profile_id: cluster.into(),
                plugin_id: "cd.elastic".into(),
                configuration: Configuration::new(),
            });
        }

        let errors = validate(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "elastic-profile[large]");
        assert_eq!(errors[0].message, "No cluster profile defined corresponding to cluster_profile_id 'ecs'");
    }

    fn repository(id: &str, name: &str, url: &str, packages: &[(&str, &str, &str)]) -> PackageRepository {
        PackageRepository {
            id: id.into(),
            name: name.into(),
            plugin: PluginConfiguration::new("yum", "1"),
            configuration: Configuration::from_properties([ConfigurationProperty::plain("REPO_URL", url)]).unwrap(),
            packages: packages
                .iter()
                .map(|(id, name, spec)| PackageDefinition {
                    id: id.to_string(),
                    name: name.to_string(),
                    auto_update: true,
                    configuration: Configuration::from_properties([
                        ConfigurationProperty::plain("PACKAGE_SPEC", *spec),
                        ConfigurationProperty::plain("POLL_VERSION_FROM", *id),
                    ])
                    .unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_package_identity_uses_metadata() {
        let mut doc = ConfigurationDocument::new();
        doc.repositories.push(repository("r1", "repo-one", "http://yum/", &[("p1", "app", "app-1.*")]));
        doc.repositories.push(repository("r2", "repo-two", "http://yum/", &[("p2", "app-copy", "app-1.*")]));

        assert!(messages(&doc).is_empty(), "poll version differs without metadata");

        let metadata = PluginMetadataStore::new().with_non_identity_keys("yum", ["POLL_VERSION_FROM"]);
        let messages: Vec<String> = Validator::new(&metadata)
            .validate(&doc)
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(
            messages,
            ["Cannot save package or repo, found duplicate packages. [Repo Name: 'repo-one', Package Name: 'app'], [Repo Name: 'repo-two', Package Name: 'app-copy']"]
        );
    }

    #[test]
    fn test_secret_references() {
        let mut doc = ConfigurationDocument::new();
        let mut pipeline =
            Pipeline::with_stages("build", Material::git("https://example.com/a.git"), [("s", ["j"])]).unwrap();
        pipeline
            .add_variable(EnvironmentVariable::plain("TOKEN", "{{SECRET:[vault][token]}}"))
            .unwrap();
        pipeline
            .add_variable(EnvironmentVariable::plain("OTHER", "{{SECRET:[missing][key]}}"))
            .unwrap();
        doc.add_pipeline("team-a", pipeline).unwrap();
        let mut environment = EnvironmentConfig::new("prod");
        environment
            .add_variable(EnvironmentVariable::plain("DB", "{{SECRET:[vault][db]}}"))
            .unwrap();
        doc.environments.push(environment);
        doc.secret_configs.push(SecretConfig {
            id: "vault".into(),
            plugin_id: "cd.vault".into(),
            description: None,
            configuration: Configuration::new(),
            rules: vec![PolicyRule::allow("refer", "pipeline_group", "team-*")],
        });

        let errors: Vec<(String, String)> = validate(&doc).into_iter().map(|e| (e.path, e.message)).collect();
        assert_eq!(
            errors,
            [
                (
                    "pipeline[build]".to_string(),
                    "Secret config with id 'missing' does not exist".to_string()
                ),
                (
                    "environment[prod]".to_string(),
                    "Environment 'prod' does not have permission to refer to secrets using secret config 'vault'"
                        .to_string()
                ),
            ]
        );
    }
}
