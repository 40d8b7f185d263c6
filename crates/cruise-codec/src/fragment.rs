//! Single-entity fragments, as submitted by editors one entity at a time

use crate::environment::{read_environment, write_environment};
use crate::job::{read_job, read_stage, write_job, write_stage};
use crate::material::{MATERIAL_ELEMENTS, read_material, write_material};
use crate::pipeline::{read_group, read_pipeline, read_template, write_group, write_pipeline, write_template};
use crate::plugin::{
    read_artifact_store, read_cluster_profile, read_config_repo, read_elastic_profile, read_repository, read_scm,
    read_secret_config, write_artifact_store, write_cluster_profile, write_config_repo, write_elastic_profile,
    write_repository, write_scm, write_secret_config,
};
use crate::security::{read_role, write_role};
use crate::task::{TASK_ELEMENTS, read_task, write_task};
use crate::{DocumentCodec, Error, Result};
use cruise_model::{
    ArtifactStore, ClusterProfile, ConfigRepoConfig, ElasticProfile, EnvironmentConfig, Job, Material,
    PackageRepository, Pipeline, PipelineGroup, Role, Scm, SecretConfig, Stage, Task, Template,
};
use cruise_xml::Element;
use std::fmt;

/// Entity kind a fragment is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpectedType {
    Pipeline,
    PipelineGroup,
    Stage,
    Job,
    Material,
    Task,
    Template,
    Environment,
    Role,
    PackageRepository,
    Scm,
    ArtifactStore,
    SecretConfig,
    ElasticProfile,
    ClusterProfile,
    ConfigRepo,
}

impl ExpectedType {
    /// Root element names accepted for this kind.
    pub fn root_elements(&self) -> &'static [&'static str] {
        match self {
            ExpectedType::Pipeline | ExpectedType::Template => &["pipeline"],
            ExpectedType::PipelineGroup => &["pipelines"],
            ExpectedType::Stage => &["stage"],
            ExpectedType::Job => &["job"],
            ExpectedType::Material => MATERIAL_ELEMENTS,
            ExpectedType::Task => TASK_ELEMENTS,
            ExpectedType::Environment => &["environment"],
            ExpectedType::Role => &["role"],
            ExpectedType::PackageRepository => &["repository"],
            ExpectedType::Scm => &["scm"],
            ExpectedType::ArtifactStore => &["artifactStore"],
            ExpectedType::SecretConfig => &["secretConfig"],
            ExpectedType::ElasticProfile => &["profile"],
            ExpectedType::ClusterProfile => &["clusterProfile"],
            ExpectedType::ConfigRepo => &["config-repo"],
        }
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpectedType::Pipeline => "pipeline",
            ExpectedType::PipelineGroup => "pipeline group",
            ExpectedType::Stage => "stage",
            ExpectedType::Job => "job",
            ExpectedType::Material => "material",
            ExpectedType::Task => "task",
            ExpectedType::Template => "template",
            ExpectedType::Environment => "environment",
            ExpectedType::Role => "role",
            ExpectedType::PackageRepository => "package repository",
            ExpectedType::Scm => "scm",
            ExpectedType::ArtifactStore => "artifact store",
            ExpectedType::SecretConfig => "secret config",
            ExpectedType::ElasticProfile => "elastic profile",
            ExpectedType::ClusterProfile => "cluster profile",
            ExpectedType::ConfigRepo => "config repo",
        };
        f.write_str(name)
    }
}

/// A parsed single entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Pipeline(Pipeline),
    PipelineGroup(PipelineGroup),
    Stage(Stage),
    Job(Job),
    Material(Material),
    Task(Task),
    Template(Template),
    Environment(EnvironmentConfig),
    Role(Role),
    PackageRepository(PackageRepository),
    Scm(Scm),
    ArtifactStore(ArtifactStore),
    SecretConfig(SecretConfig),
    ElasticProfile(ElasticProfile),
    ClusterProfile(ClusterProfile),
    ConfigRepo(ConfigRepoConfig),
}

impl Fragment {
    pub fn kind(&self) -> ExpectedType {
        match self {
            Fragment::Pipeline(_) => ExpectedType::Pipeline,
            Fragment::PipelineGroup(_) => ExpectedType::PipelineGroup,
            Fragment::Stage(_) => ExpectedType::Stage,
            Fragment::Job(_) => ExpectedType::Job,
            Fragment::Material(_) => ExpectedType::Material,
            Fragment::Task(_) => ExpectedType::Task,
            Fragment::Template(_) => ExpectedType::Template,
            Fragment::Environment(_) => ExpectedType::Environment,
            Fragment::Role(_) => ExpectedType::Role,
            Fragment::PackageRepository(_) => ExpectedType::PackageRepository,
            Fragment::Scm(_) => ExpectedType::Scm,
            Fragment::ArtifactStore(_) => ExpectedType::ArtifactStore,
            Fragment::SecretConfig(_) => ExpectedType::SecretConfig,
            Fragment::ElasticProfile(_) => ExpectedType::ElasticProfile,
            Fragment::ClusterProfile(_) => ExpectedType::ClusterProfile,
            Fragment::ConfigRepo(_) => ExpectedType::ConfigRepo,
        }
    }
}

impl DocumentCodec<'_> {
    /// Parse one entity of kind `expected` in isolation.
    pub fn parse_fragment(&self, bytes: &[u8], expected: ExpectedType) -> Result<Fragment> {
        let root = cruise_xml::parse_bytes(bytes)?;
        self.read_fragment(&root, expected)
    }

    pub fn read_fragment(&self, root: &Element, expected: ExpectedType) -> Result<Fragment> {
        if !expected.root_elements().contains(&root.name.as_str()) {
            return Err(Error::TypeMismatch {
                expected,
                found: root.name.clone(),
            });
        }
        Ok(match expected {
            ExpectedType::Pipeline => Fragment::Pipeline(read_pipeline(self, root)?),
            ExpectedType::PipelineGroup => Fragment::PipelineGroup(read_group(self, root)?),
            ExpectedType::Stage => Fragment::Stage(read_stage(self, root)?),
            ExpectedType::Job => Fragment::Job(read_job(self, root)?),
            ExpectedType::Material => Fragment::Material(read_material(self, root)?),
            ExpectedType::Task => Fragment::Task(read_task(root, false)?),
            ExpectedType::Template => Fragment::Template(read_template(self, root)?),
            ExpectedType::Environment => Fragment::Environment(read_environment(self, root)?),
            ExpectedType::Role => Fragment::Role(read_role(root)?),
            ExpectedType::PackageRepository => Fragment::PackageRepository(read_repository(root)?),
            ExpectedType::Scm => Fragment::Scm(read_scm(root)?),
            ExpectedType::ArtifactStore => Fragment::ArtifactStore(read_artifact_store(root)?),
            ExpectedType::SecretConfig => Fragment::SecretConfig(read_secret_config(root)?),
            ExpectedType::ElasticProfile => Fragment::ElasticProfile(read_elastic_profile(root)?),
            ExpectedType::ClusterProfile => Fragment::ClusterProfile(read_cluster_profile(root)?),
            ExpectedType::ConfigRepo => Fragment::ConfigRepo(read_config_repo(self, root)?),
        })
    }
}

/// The canonical element of a fragment.
pub fn fragment_element(fragment: &Fragment) -> Element {
    match fragment {
        Fragment::Pipeline(p) => write_pipeline(p),
        Fragment::PipelineGroup(g) => write_group(g),
        Fragment::Stage(s) => write_stage(s),
        Fragment::Job(j) => write_job(j),
        Fragment::Material(m) => write_material(m),
        Fragment::Task(t) => write_task(t),
        Fragment::Template(t) => write_template(t),
        Fragment::Environment(e) => write_environment(e),
        Fragment::Role(r) => write_role(r),
        Fragment::PackageRepository(r) => write_repository(r),
        Fragment::Scm(s) => write_scm(s),
        Fragment::ArtifactStore(s) => write_artifact_store(s),
        Fragment::SecretConfig(s) => write_secret_config(s),
        Fragment::ElasticProfile(p) => write_elastic_profile(p),
        Fragment::ClusterProfile(p) => write_cluster_profile(p),
        Fragment::ConfigRepo(r) => write_config_repo(r),
    }
}

pub fn serialize_fragment(fragment: &Fragment) -> String {
    cruise_xml::write_fragment(&fragment_element(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ExpectedType::Job, r#"<job name="unit"><tasks><exec command="make" /></tasks></job>"#)]
    #[case(ExpectedType::Material, r#"<git url="https://example.com/app.git" />"#)]
    #[case(ExpectedType::Task, r#"<ant target="build" />"#)]
    #[case(ExpectedType::Role, r#"<role name="devs"><users><user>ann</user></users></role>"#)]
    #[case(ExpectedType::ArtifactStore, r#"<artifactStore id="s3" pluginId="cd.go.s3" />"#)]
    fn test_fragment_kinds(#[case] expected: ExpectedType, #[case] xml: &str) {
        let fragment = DocumentCodec::new().parse_fragment(xml.as_bytes(), expected).unwrap();
        assert_eq!(fragment.kind(), expected);
    }

    #[test]
    fn test_type_mismatch_names_requested_type() {
        let err = DocumentCodec::new()
            .parse_fragment(br#"<job name="unit" />"#, ExpectedType::Stage)
            .unwrap_err();
        assert_eq!(err.to_string(), "Expected a stage fragment but found <job>");
        assert!(matches!(err, Error::TypeMismatch { expected: ExpectedType::Stage, .. }));
    }

    #[test]
    fn test_fragment_serialization_is_stable() {
        let xml = r#"<stage name="deploy"><approval type="manual" /><jobs><job name="push"><resources><resource>linux</resource></resources></job></jobs></stage>"#;
        let codec = DocumentCodec::new();
        let first = serialize_fragment(&codec.parse_fragment(xml.as_bytes(), ExpectedType::Stage).unwrap());
        let second = serialize_fragment(&codec.parse_fragment(first.as_bytes(), ExpectedType::Stage).unwrap());
        assert_eq!(first, second);
    }
}
