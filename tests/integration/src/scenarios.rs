//! Cross-crate scenarios: load, migrate, merge and validate whole documents

use cruise_core::{ConfigLoader, EngineSettings, Error};
use cruise_model::{PropertyValue, RepoOrigin};
use cruise_secure::{PluginMetadataStore, SecureCipher};
use cruise_test_utils::fixtures::{self, LEGACY_DES_PLAINTEXT, LEGACY_DES_TOKEN};
use cruise_test_utils::workspace::TestWorkspace;
use pretty_assertions::assert_eq;

/// Cipher built the way the CLI builds it, from settings in a workspace.
fn workspace_cipher(ws: &TestWorkspace) -> SecureCipher {
    let settings_path = ws.with_keys();
    let (settings, _) = EngineSettings::discover(Some(&settings_path), ws.root()).unwrap();
    settings.cipher(&ws.path("cruise-config.xml")).unwrap()
}

#[test]
fn test_basic_load() {
    let ws = TestWorkspace::new();
    let path = ws.config(&fixtures::two_stage_pipeline());
    let cipher = workspace_cipher(&ws);

    let loaded = ConfigLoader::new(&cipher).load_file(&path, Vec::new()).unwrap();

    let pipeline = loaded.holder.config.pipeline_by_name("pipeline1").unwrap();
    let stage = pipeline.stage(0).unwrap();
    assert_eq!(stage.job("plan1").unwrap().resources(), ["tiger", "lion"]);
    assert_eq!(pipeline.materials()[0].type_name(), "Subversion");
}

#[test]
fn test_migration_reencrypts_legacy_secure_value() {
    let ws = TestWorkspace::new();
    let path = ws.config(&fixtures::v88_with_des_variable());
    let cipher = workspace_cipher(&ws);

    let loaded = ConfigLoader::new(&cipher).load_file(&path, Vec::new()).unwrap();

    assert!(!loaded.xml.contains(LEGACY_DES_TOKEN));
    let variable = loaded
        .holder
        .config_for_edit
        .pipeline_by_name("legacy")
        .unwrap()
        .variables()
        .get("PASSWORD")
        .unwrap()
        .clone();
    let PropertyValue::Encrypted(token) = &variable.value else {
        panic!("secure variable lost its encryption");
    };
    assert!(token.starts_with("AES:"));
    assert_eq!(cipher.decrypt(token).unwrap(), LEGACY_DES_PLAINTEXT);
}

#[test]
fn test_template_exclusivity() {
    let body = r#"<pipelines group="first">
    <pipeline name="pipeline1" template="abc">
      <materials>
        <svn url="svnurl" />
      </materials>
      <stage name="badstage">
        <jobs><job name="job1" /></jobs>
      </stage>
    </pipeline>
  </pipelines>"#;
    let cipher = SecureCipher::generate();

    let err = ConfigLoader::new(&cipher)
        .load(fixtures::current(body).as_bytes(), Vec::new())
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("'pipeline1'"), "{message}");
    assert!(message.contains("'abc'"), "{message}");
}

#[test]
fn test_merge_collision_between_fragments() {
    let cipher = SecureCipher::generate();
    let loader = ConfigLoader::new(&cipher);
    let fragment = |name: &str, fingerprint: &str| {
        loader
            .parse_partial(fixtures::partial_with_pipeline(name).as_bytes(), RepoOrigin::new(fingerprint))
            .unwrap()
    };

    let err = loader
        .load(
            fixtures::two_stage_pipeline().as_bytes(),
            vec![fragment("Test", "fp-first"), fragment("TEST", "fp-second")],
        )
        .unwrap_err();

    assert!(matches!(err, Error::Merge { .. }));
    let message = err.to_string();
    assert!(message.contains("fp-first"), "{message}");
    assert!(message.contains("fp-second"), "{message}");
}

#[test]
fn test_fragment_colliding_with_file_pipeline() {
    let cipher = SecureCipher::generate();
    let loader = ConfigLoader::new(&cipher);
    let fragment = loader
        .parse_partial(fixtures::partial_with_pipeline("Pipeline1").as_bytes(), RepoOrigin::new("fp"))
        .unwrap();

    let err = loader
        .load(fixtures::two_stage_pipeline().as_bytes(), vec![fragment])
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Pipeline 'Pipeline1' is defined in both cruise-config.xml and fp"
    );
}

#[test]
fn test_plugin_secure_properties_encrypted_on_load() {
    let body = r#"<artifactStores>
    <artifactStore id="hub" pluginId="cd.docker">
      <property>
        <key>username</key>
        <value>ci</value>
      </property>
      <property>
        <key>password</key>
        <value>hunter2</value>
      </property>
    </artifactStore>
  </artifactStores>"#;
    let cipher = SecureCipher::generate();
    let metadata = PluginMetadataStore::new().with_plugin("cd.docker", ["password"]);

    let loaded = ConfigLoader::new(&cipher)
        .with_lookup(&metadata)
        .load(fixtures::current(body).as_bytes(), Vec::new())
        .unwrap();

    let store = &loaded.holder.config_for_edit.artifact_stores[0];
    let password = &store.configuration.get("password").unwrap().value;
    assert!(password.is_secure());
    assert_eq!(password.plaintext(&cipher).unwrap(), "hunter2");
    assert!(!store.configuration.get("username").unwrap().is_secure());
}

#[test]
fn test_processed_view_is_independent_of_editable_view() {
    let cipher = SecureCipher::generate();
    let mut loaded = ConfigLoader::new(&cipher)
        .load(fixtures::two_stage_pipeline().as_bytes(), Vec::new())
        .unwrap();

    loaded
        .holder
        .config
        .pipeline_by_name_mut("pipeline1")
        .unwrap()
        .label_template = "changed-${COUNT}".into();

    let editable = loaded.holder.config_for_edit.pipeline_by_name("pipeline1").unwrap();
    assert_ne!(editable.label_template, "changed-${COUNT}");
}
