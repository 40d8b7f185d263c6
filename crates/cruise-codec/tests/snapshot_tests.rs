//! Snapshots of canonical output.

use cruise_codec::{ExpectedType, parse_document, parse_fragment, serialize, serialize_fragment};
use cruise_test_utils::fixtures;

#[test]
fn test_stage_fragment_snapshot() {
    let xml = r#"<stage name="deploy"><approval type="manual"/><jobs><job name="push" timeout="5"><tasks><exec command="deploy.sh" args="--prod"><runif status="passed"/></exec></tasks><resources><resource>linux</resource></resources></job></jobs></stage>"#;
    let fragment = parse_fragment(xml.as_bytes(), ExpectedType::Stage).unwrap();
    insta::assert_snapshot!(serialize_fragment(&fragment).trim_end(), @r###"
    <stage name="deploy">
      <approval type="manual" />
      <jobs>
        <job name="push" timeout="5">
          <tasks>
            <exec command="deploy.sh" args="--prod">
              <runif status="passed" />
            </exec>
          </tasks>
          <resources>
            <resource>linux</resource>
          </resources>
        </job>
      </jobs>
    </stage>
    "###);
}

#[test]
fn test_document_snapshot() {
    let doc = parse_document(fixtures::two_stage_pipeline().as_bytes()).unwrap();
    insta::assert_snapshot!(serialize(&doc).trim_end(), @r###"
    <?xml version="1.0" encoding="utf-8"?>
    <cruise schemaVersion="139">
      <pipelines group="defaultGroup">
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
      </pipelines>
    </cruise>
    "###);
}
