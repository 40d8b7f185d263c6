//! Whole-document parsing and canonical serialization.

use cruise_codec::{DocumentCodec, Error, parse_document, parse_partial, serialize, serialize_partial};
use cruise_model::{CURRENT_SCHEMA_VERSION, EnvironmentVariable, Material, RepoOrigin, RunType};
use cruise_secure::{AesKey, SecureCipher};
use cruise_test_utils::builders::{PipelineXml, group};
use cruise_test_utils::fixtures;
use pretty_assertions::assert_eq;

#[test]
fn test_fixture_version_matches_codec() {
    assert_eq!(cruise_test_utils::CURRENT_VERSION, CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_basic_load() {
    let doc = parse_document(fixtures::two_stage_pipeline().as_bytes()).unwrap();
    let pipeline = doc.pipeline_by_name("pipeline1").unwrap();

    assert_eq!(pipeline.stages().len(), 2);
    assert!(matches!(pipeline.materials(), [Material::Svn(_)]));
    let plan = pipeline.stage(0).unwrap().job("plan1").unwrap();
    assert_eq!(plan.resources(), ["tiger".to_string(), "lion".to_string()]);
    assert!(pipeline.stage(1).unwrap().approval.is_manual());
}

#[test]
fn test_serialize_is_byte_stable() {
    let first = serialize(&parse_document(fixtures::two_stage_pipeline().as_bytes()).unwrap());
    let reparsed = parse_document(first.as_bytes()).unwrap();
    assert_eq!(serialize(&reparsed), first);
    assert_eq!(reparsed, parse_document(fixtures::two_stage_pipeline().as_bytes()).unwrap());
}

#[test]
fn test_rich_document_round_trip() {
    let body = format!(
        r#"<server artifactsdir="artifacts" jobTimeout="60">
    <security>
      <roles>
        <role name="deployers">
          <users><user>ann</user></users>
          <policy><allow action="view" type="environment">*</allow></policy>
        </role>
      </roles>
      <admins><user>root</user></admins>
    </security>
  </server>
  <config-repos>
    <config-repo id="remote" pluginId="yaml.config.plugin">
      <git url="https://example.com/config.git" />
    </config-repo>
  </config-repos>
  <elastic jobStarvationTimeout="3">
    <clusterProfiles><clusterProfile id="k8s" pluginId="cd.go.k8s" /></clusterProfiles>
    <profiles><profile id="small" clusterProfileId="k8s" pluginId="cd.go.k8s" /></profiles>
  </elastic>
  <artifactStores>
    <artifactStore id="s3" pluginId="cd.go.s3"><property><key>Bucket</key><value>builds</value></property></artifactStore>
  </artifactStores>
  <secretConfigs>
    <secretConfig id="vault" pluginId="cd.go.vault">
      <description>team secrets</description>
      <rules><allow action="refer" type="pipeline_group">first</allow></rules>
    </secretConfig>
  </secretConfigs>
  <scms>
    <scm id="scm-1" name="plugin-scm"><pluginConfiguration id="github.pr" version="1" /><configuration /></scm>
  </scms>
  {}
  <templates>
    <pipeline name="shared"><stage name="s"><jobs><job name="j" /></jobs></stage></pipeline>
  </templates>
  <environments>
    <environment name="uat"><pipelines><pipeline name="build" /></pipelines></environment>
  </environments>"#,
        group(
            "first",
            &[
                PipelineXml::new("build").stage("compile", &["unit"]),
                PipelineXml::new("from-template").attr("template", "shared"),
            ]
        )
    );
    let doc = parse_document(fixtures::current(&body).as_bytes()).unwrap();
    assert_eq!(doc.server.security.admins.len(), 1);
    assert_eq!(doc.config_repos[0].id, "remote");
    assert_eq!(doc.elastic.profile("small").unwrap().cluster_profile_id, "k8s");
    assert!(doc.secret_config("vault").unwrap().can_be_referred_by("pipeline_group", "first"));
    assert!(doc.pipeline_by_name("from-template").unwrap().has_template());

    let out = serialize(&doc);
    assert_eq!(parse_document(out.as_bytes()).unwrap(), doc);
    assert_eq!(serialize(&parse_document(out.as_bytes()).unwrap()), out);
}

#[test]
fn test_run_type_and_encrypted_password() {
    let body = group(
        "first",
        &[PipelineXml::new("multi")
            .material(r#"<svn url="http://svn" username="bob" password="secret" />"#)
            .raw_stage(r#"<stage name="s"><jobs><job name="j" runInstanceCount="3" /></jobs></stage>"#)],
    );
    let cipher = SecureCipher::with_aes_key(AesKey::from_hex("00112233445566778899aabbccddeeff").unwrap());
    let doc = DocumentCodec::with_cipher(&cipher)
        .parse_document(fixtures::current(&body).as_bytes())
        .unwrap();

    let job = doc.job_by_name("multi", "s", "j").unwrap();
    assert_eq!(job.run_type, RunType::Instances(3));
    let Material::Svn(svn) = &doc.pipeline_by_name("multi").unwrap().materials()[0] else {
        panic!("expected svn material");
    };
    let password = svn.password.as_ref().unwrap();
    assert!(password.is_secure());
    assert_eq!(password.plaintext(&cipher).unwrap(), "secret");
    assert!(!serialize(&doc).contains("secret\""));
}

#[test]
fn test_secure_variable_value_needs_cipher() {
    let body = group(
        "first",
        &[PipelineXml::new("p").stage("s", &["j"])],
    )
    .replace(
        "<materials>",
        r#"<environmentvariables><variable name="TOKEN" secure="true"><value>abc</value></variable></environmentvariables><materials>"#,
    );
    let xml = fixtures::current(&body);
    let err = parse_document(xml.as_bytes()).unwrap_err();
    assert!(err.is_structural());

    let cipher = SecureCipher::with_aes_key(AesKey::generate());
    let doc = DocumentCodec::with_cipher(&cipher).parse_document(xml.as_bytes()).unwrap();
    let variable: &EnvironmentVariable = doc.pipeline_by_name("p").unwrap().variables().get("token").unwrap();
    assert_eq!(variable.value.plaintext(&cipher).unwrap(), "abc");
}

#[test]
fn test_template_with_own_stages_names_both() {
    let body = group(
        "first",
        &[PipelineXml::new("pipeline-with-template").attr("template", "abc").stage("s", &["j"])],
    );
    let err = parse_document(fixtures::current(&body).as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Model(_)));
    let message = err.to_string();
    assert!(message.contains("pipeline-with-template"), "{message}");
    assert!(message.contains("abc"), "{message}");
}

#[test]
fn test_partial_round_trip() {
    let origin = RepoOrigin::new("fingerprint").with_repo_id("remote");
    let partial = parse_partial(fixtures::partial_with_pipeline("Test").as_bytes(), origin.clone()).unwrap();
    assert_eq!(partial.pipeline_names().map(|n| n.as_str()).collect::<Vec<_>>(), ["Test"]);

    let out = serialize_partial(&partial);
    let again = parse_partial(out.as_bytes(), origin).unwrap();
    assert_eq!(again, partial);
}
