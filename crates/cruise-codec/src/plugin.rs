//! Plugin-backed entities: config repositories, elastic profiles, artifact
//! stores, secret configs, package repositories and SCMs

use crate::material::{SCM_ELEMENTS, read_material, write_material};
use crate::property::{
    read_configuration, read_plugin_configuration, read_properties, text_element, write_configuration,
    write_plugin_configuration, write_properties,
};
use crate::schema::{
    IdentityConstraint, any_number, bool_attr, check_attrs, check_name, check_sequence, optional, parse_integer,
    require_attr, require_entity_attr, required, text_of,
};
use crate::security::{read_rules, write_rules};
use crate::{DocumentCodec, Error, Result};
use cruise_model::{
    ArtifactStore, ClusterProfile, ConfigRepoConfig, ElasticConfig, ElasticProfile, PackageDefinition,
    PackageRepository, Scm, SecretConfig,
};
use cruise_xml::Element;

pub(crate) fn read_config_repos(codec: &DocumentCodec<'_>, element: &Element) -> Result<Vec<ConfigRepoConfig>> {
    check_attrs(element, &[])?;
    check_sequence(element, &[any_number(&["config-repo"])])?;
    element
        .children_named("config-repo")
        .map(|repo| read_config_repo(codec, repo))
        .collect()
}

pub(crate) fn read_config_repo(codec: &DocumentCodec<'_>, element: &Element) -> Result<ConfigRepoConfig> {
    check_attrs(element, &["id", "pluginId"])?;
    check_sequence(element, &[required(SCM_ELEMENTS), optional(&["configuration"])])?;
    let id = require_entity_attr(element, "id", "Id", "ConfigRepo")?;
    let plugin_id = require_entity_attr(element, "pluginId", "Plugin id", "ConfigRepo")?;
    let material = element
        .elements()
        .find(|e| SCM_ELEMENTS.contains(&e.name.as_str()))
        .ok_or_else(|| Error::structural("config-repo", "Config repository must have a material."))?;
    let material = read_material(codec, material)?;
    Ok(ConfigRepoConfig {
        id: check_name(element, "Id", id)?.to_string(),
        plugin_id: plugin_id.to_string(),
        material,
        configuration: read_configuration(element)?,
    })
}

pub(crate) fn write_config_repo(repo: &ConfigRepoConfig) -> Element {
    let mut element = Element::new("config-repo")
        .with_attr("id", &repo.id)
        .with_attr("pluginId", &repo.plugin_id)
        .with_child(write_material(&repo.material));
    if !repo.configuration.is_empty() {
        write_configuration(&mut element, &repo.configuration);
    }
    element
}

pub(crate) fn read_elastic(element: &Element) -> Result<ElasticConfig> {
    check_attrs(element, &["jobStarvationTimeout"])?;
    check_sequence(element, &[optional(&["clusterProfiles"]), optional(&["profiles"])])?;
    let mut elastic = ElasticConfig {
        job_starvation_timeout: element
            .attr("jobStarvationTimeout")
            .map(|t| parse_integer(element, t))
            .transpose()?,
        ..ElasticConfig::default()
    };
    if let Some(clusters) = element.child("clusterProfiles") {
        check_attrs(clusters, &[])?;
        check_sequence(clusters, &[any_number(&["clusterProfile"])])?;
        for cluster in clusters.children_named("clusterProfile") {
            elastic.cluster_profiles.push(read_cluster_profile(cluster)?);
        }
    }
    if let Some(profiles) = element.child("profiles") {
        check_attrs(profiles, &[])?;
        check_sequence(profiles, &[any_number(&["profile"])])?;
        for profile in profiles.children_named("profile") {
            elastic.profiles.push(read_elastic_profile(profile)?);
        }
    }
    Ok(elastic)
}

pub(crate) fn read_cluster_profile(element: &Element) -> Result<ClusterProfile> {
    check_attrs(element, &["id", "pluginId"])?;
    check_sequence(element, &[any_number(&["property"])])?;
    Ok(ClusterProfile {
        id: require_entity_attr(element, "id", "Id", "ClusterProfile")?.to_string(),
        plugin_id: require_entity_attr(element, "pluginId", "Plugin id", "ClusterProfile")?.to_string(),
        configuration: read_properties(element)?,
    })
}

pub(crate) fn read_elastic_profile(element: &Element) -> Result<ElasticProfile> {
    check_attrs(element, &["id", "clusterProfileId", "pluginId"])?;
    check_sequence(element, &[any_number(&["property"])])?;
    Ok(ElasticProfile {
        id: require_entity_attr(element, "id", "Id", "ElasticProfile")?.to_string(),
        cluster_profile_id: require_entity_attr(element, "clusterProfileId", "Cluster profile id", "ElasticProfile")?
            .to_string(),
        plugin_id: require_entity_attr(element, "pluginId", "Plugin id", "ElasticProfile")?.to_string(),
        configuration: read_properties(element)?,
    })
}

pub(crate) fn write_elastic(elastic: &ElasticConfig) -> Element {
    let mut element = Element::new("elastic");
    element.set_opt_attr("jobStarvationTimeout", elastic.job_starvation_timeout.map(|t| t.to_string()));
    if !elastic.cluster_profiles.is_empty() {
        let mut clusters = Element::new("clusterProfiles");
        for cluster in &elastic.cluster_profiles {
            clusters.push(write_cluster_profile(cluster));
        }
        element.push(clusters);
    }
    if !elastic.profiles.is_empty() {
        let mut profiles = Element::new("profiles");
        for profile in &elastic.profiles {
            profiles.push(write_elastic_profile(profile));
        }
        element.push(profiles);
    }
    element
}

pub(crate) fn write_cluster_profile(cluster: &ClusterProfile) -> Element {
    let mut e = Element::new("clusterProfile")
        .with_attr("id", &cluster.id)
        .with_attr("pluginId", &cluster.plugin_id);
    write_properties(&mut e, &cluster.configuration);
    e
}

pub(crate) fn write_elastic_profile(profile: &ElasticProfile) -> Element {
    let mut e = Element::new("profile")
        .with_attr("id", &profile.id)
        .with_attr("clusterProfileId", &profile.cluster_profile_id)
        .with_attr("pluginId", &profile.plugin_id);
    write_properties(&mut e, &profile.configuration);
    e
}

pub(crate) fn read_artifact_stores(element: &Element) -> Result<Vec<ArtifactStore>> {
    check_attrs(element, &[])?;
    check_sequence(element, &[any_number(&["artifactStore"])])?;
    element.children_named("artifactStore").map(read_artifact_store).collect()
}

pub(crate) fn read_artifact_store(element: &Element) -> Result<ArtifactStore> {
    check_attrs(element, &["id", "pluginId"])?;
    check_sequence(element, &[any_number(&["property"])])?;
    Ok(ArtifactStore {
        id: require_entity_attr(element, "id", "Id", "ArtifactStore")?.to_string(),
        plugin_id: require_entity_attr(element, "pluginId", "Plugin id", "ArtifactStore")?.to_string(),
        configuration: read_properties(element)?,
    })
}

pub(crate) fn write_artifact_store(store: &ArtifactStore) -> Element {
    let mut e = Element::new("artifactStore")
        .with_attr("id", &store.id)
        .with_attr("pluginId", &store.plugin_id);
    write_properties(&mut e, &store.configuration);
    e
}

pub(crate) fn read_secret_configs(element: &Element) -> Result<Vec<SecretConfig>> {
    check_attrs(element, &[])?;
    check_sequence(element, &[any_number(&["secretConfig"])])?;
    element.children_named("secretConfig").map(read_secret_config).collect()
}

pub(crate) fn read_secret_config(element: &Element) -> Result<SecretConfig> {
    check_attrs(element, &["id", "pluginId"])?;
    check_sequence(
        element,
        &[optional(&["description"]), optional(&["configuration"]), optional(&["rules"])],
    )?;
    let rules = match element.child("rules") {
        Some(rules) => {
            check_attrs(rules, &[])?;
            read_rules(rules)?
        }
        None => Vec::new(),
    };
    Ok(SecretConfig {
        id: require_entity_attr(element, "id", "Id", "SecretConfig")?.to_string(),
        plugin_id: require_entity_attr(element, "pluginId", "Plugin id", "SecretConfig")?.to_string(),
        description: element.child("description").and_then(text_of),
        configuration: read_configuration(element)?,
        rules,
    })
}

pub(crate) fn write_secret_config(secret: &SecretConfig) -> Element {
    let mut e = Element::new("secretConfig")
        .with_attr("id", &secret.id)
        .with_attr("pluginId", &secret.plugin_id);
    if let Some(description) = &secret.description {
        e.push(text_element("description", description));
    }
    write_configuration(&mut e, &secret.configuration);
    if !secret.rules.is_empty() {
        let mut rules = Element::new("rules");
        write_rules(&mut rules, &secret.rules);
        e.push(rules);
    }
    e
}

/// Read `<repositories>`. Repository ids and names, and package ids, are unique.
pub(crate) fn read_repositories(element: &Element, package_ids: &mut IdentityConstraint) -> Result<Vec<PackageRepository>> {
    check_attrs(element, &[])?;
    check_sequence(element, &[any_number(&["repository"])])?;
    let mut ids = IdentityConstraint::new("repositories");
    let mut names = IdentityConstraint::new("repositories");
    let mut repositories = Vec::new();
    for repository in element.children_named("repository") {
        let repository = read_repository(repository)?;
        ids.insert(&repository.id)?;
        names.insert(&repository.name)?;
        for package in &repository.packages {
            package_ids.insert(&package.id)?;
        }
        repositories.push(repository);
    }
    Ok(repositories)
}

pub(crate) fn read_repository(element: &Element) -> Result<PackageRepository> {
    check_attrs(element, &["id", "name"])?;
    check_sequence(
        element,
        &[required(&["pluginConfiguration"]), required(&["configuration"]), optional(&["packages"])],
    )?;
    let mut packages = Vec::new();
    if let Some(list) = element.child("packages") {
        check_attrs(list, &[])?;
        check_sequence(list, &[any_number(&["package"])])?;
        for package in list.children_named("package") {
            check_attrs(package, &["id", "name", "autoUpdate"])?;
            check_sequence(package, &[required(&["configuration"])])?;
            packages.push(PackageDefinition {
                id: check_name(package, "Package id", require_attr(package, "id")?)?.to_string(),
                name: check_name(package, "Name", require_attr(package, "name")?)?.to_string(),
                auto_update: bool_attr(package, "autoUpdate", true)?,
                configuration: read_configuration(package)?,
            });
        }
    }
    Ok(PackageRepository {
        id: check_name(element, "Repo id", require_attr(element, "id")?)?.to_string(),
        name: check_name(element, "Name", require_attr(element, "name")?)?.to_string(),
        plugin: read_plugin_configuration(element)?,
        configuration: read_configuration(element)?,
        packages,
    })
}

pub(crate) fn write_repository(repository: &PackageRepository) -> Element {
    let mut e = Element::new("repository")
        .with_attr("id", &repository.id)
        .with_attr("name", &repository.name);
    write_plugin_configuration(&mut e, &repository.plugin);
    write_configuration(&mut e, &repository.configuration);
    if !repository.packages.is_empty() {
        let mut packages = Element::new("packages");
        for package in &repository.packages {
            let mut p = Element::new("package")
                .with_attr("id", &package.id)
                .with_attr("name", &package.name);
            if !package.auto_update {
                p.set_attr("autoUpdate", "false");
            }
            write_configuration(&mut p, &package.configuration);
            packages.push(p);
        }
        e.push(packages);
    }
    e
}

pub(crate) fn read_scms(element: &Element) -> Result<Vec<Scm>> {
    check_attrs(element, &[])?;
    check_sequence(element, &[any_number(&["scm"])])?;
    let mut ids = IdentityConstraint::new("scms");
    let mut scms = Vec::new();
    for scm in element.children_named("scm") {
        let scm = read_scm(scm)?;
        ids.insert(&scm.id)?;
        scms.push(scm);
    }
    Ok(scms)
}

pub(crate) fn read_scm(element: &Element) -> Result<Scm> {
    check_attrs(element, &["id", "name", "autoUpdate"])?;
    check_sequence(element, &[required(&["pluginConfiguration"]), required(&["configuration"])])?;
    Ok(Scm {
        id: require_attr(element, "id")?.to_string(),
        name: check_name(element, "Name", require_attr(element, "name")?)?.to_string(),
        auto_update: bool_attr(element, "autoUpdate", true)?,
        plugin: read_plugin_configuration(element)?,
        configuration: read_configuration(element)?,
    })
}

pub(crate) fn write_scm(scm: &Scm) -> Element {
    let mut e = Element::new("scm").with_attr("id", &scm.id).with_attr("name", &scm.name);
    if !scm.auto_update {
        e.set_attr("autoUpdate", "false");
    }
    write_plugin_configuration(&mut e, &scm.plugin);
    write_configuration(&mut e, &scm.configuration);
    e
}
