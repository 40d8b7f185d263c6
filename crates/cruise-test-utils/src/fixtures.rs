//! Complete configuration documents.

use crate::CURRENT_VERSION;

/// Wrap `body` in a `<cruise>` root at `version`.
pub fn versioned(version: u32, body: &str) -> String {
    format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<cruise schemaVersion=\"{version}\">\n{body}\n</cruise>\n")
}

/// Wrap `body` in a `<cruise>` root at the current version.
pub fn current(body: &str) -> String {
    versioned(CURRENT_VERSION, body)
}

/// One pipeline with two stages and a Subversion material. Job `plan1`
/// requires the `tiger` and `lion` resources.
pub fn two_stage_pipeline() -> String {
    current(
        r#"<pipelines group="defaultGroup">
    <pipeline name="pipeline1">
      <materials>
        <svn url="svnurl" username="user" />
      </materials>
      <stage name="mingle">
        <jobs>
          <job name="plan1">
            <tasks>
              <ant buildfile="build.xml" target="test" />
            </tasks>
            <resources>
              <resource>tiger</resource>
              <resource>lion</resource>
            </resources>
          </job>
        </jobs>
      </stage>
      <stage name="deploy">
        <approval type="manual" />
        <jobs>
          <job name="push">
            <tasks>
              <exec command="deploy.sh" />
            </tasks>
          </job>
        </jobs>
      </stage>
    </pipeline>
  </pipelines>"#,
    )
}

/// Legacy DES token of the plaintext `user-password!` under the built-in key.
pub const LEGACY_DES_TOKEN: &str = "mvcX9yrQsM4iPgm1tDxN1A==";

pub const LEGACY_DES_PLAINTEXT: &str = "user-password!";

/// A version 88 document with a DES-encrypted secure variable.
pub fn v88_with_des_variable() -> String {
    versioned(
        88,
        &format!(
            r#"<pipelines group="first">
    <pipeline name="legacy" lockBehavior="lockOnFailure">
      <environmentvariables>
        <variable name="PASSWORD" secure="true">
          <encryptedValue>{LEGACY_DES_TOKEN}</encryptedValue>
        </variable>
      </environmentvariables>
      <materials>
        <git url="https://example.com/legacy.git" />
      </materials>
      <stage name="build">
        <jobs>
          <job name="compile">
            <tasks>
              <exec command="make" />
            </tasks>
            <artifacts>
              <artifact type="build" src="target/app.jar" />
              <artifact type="test" src="target/reports" dest="reports" />
            </artifacts>
          </job>
        </jobs>
      </stage>
    </pipeline>
  </pipelines>"#
        ),
    )
}

/// A version 58 document using shapes later versions replaced: a boolean
/// lock, untyped and `<test>` artifacts, a fetch without origin and a TFS
/// username carrying its domain.
pub fn v58_legacy_shapes() -> String {
    versioned(
        58,
        r#"<pipelines group="first">
    <pipeline name="old" isLocked="true">
      <materials>
        <tfs url="http://tfs.example.com" username="CORP\ann" projectPath="$/app" />
      </materials>
      <stage name="build">
        <jobs>
          <job name="compile">
            <artifacts>
              <artifact src="target/app.jar" />
              <test src="target/reports" dest="reports" />
            </artifacts>
          </job>
        </jobs>
      </stage>
      <stage name="verify">
        <jobs>
          <job name="check">
            <tasks>
              <fetchartifact stage="build" job="compile" srcfile="app.jar" />
            </tasks>
          </job>
        </jobs>
      </stage>
    </pipeline>
  </pipelines>"#,
    )
}

/// Two pipelines where `downstream` depends on `upstream` stage `build` but
/// fetches from the later stage `deploy`.
pub fn fetch_from_later_stage() -> String {
    current(
        r#"<pipelines group="first">
    <pipeline name="upstream">
      <materials>
        <git url="https://example.com/up.git" />
      </materials>
      <stage name="build">
        <jobs><job name="compile" /></jobs>
      </stage>
      <stage name="deploy">
        <jobs><job name="push" /></jobs>
      </stage>
    </pipeline>
    <pipeline name="downstream">
      <materials>
        <pipeline pipelineName="upstream" stageName="build" />
      </materials>
      <stage name="test">
        <jobs>
          <job name="verify">
            <tasks>
              <fetchartifact artifactOrigin="gocd" pipeline="upstream" stage="deploy" job="push" srcfile="app.jar" />
            </tasks>
          </job>
        </jobs>
      </stage>
    </pipeline>
  </pipelines>"#,
    )
}

/// A config-repo fragment declaring a single pipeline called `name`.
pub fn partial_with_pipeline(name: &str) -> String {
    format!(
        r#"<cruise>
  <pipelines group="remote">
    <pipeline name="{name}">
      <materials>
        <git url="https://example.com/{name}.git" />
      </materials>
      <stage name="build">
        <jobs><job name="compile" /></jobs>
      </stage>
    </pipeline>
  </pipelines>
</cruise>
"#
    )
}
