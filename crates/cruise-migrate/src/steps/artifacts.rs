use crate::{MigrationContext, Result};
use cruise_xml::Element;

/// Legacy `<test>` artifacts become `<artifact type="test">`; untyped artifacts are build artifacts.
pub(crate) fn type_artifacts(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    root.for_each_named("artifacts", &mut |artifacts| {
        for artifact in artifacts.elements_mut() {
            match artifact.name.as_str() {
                "test" => {
                    artifact.name = "artifact".to_string();
                    artifact.set_attr("type", "test");
                }
                "artifact" if !artifact.has_attr("type") => artifact.set_attr("type", "build"),
                _ => {}
            }
        }
    });
    Ok(())
}

pub(crate) fn fetch_origin(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    root.for_each_named("fetchartifact", &mut |fetch| {
        if !fetch.has_attr("artifactOrigin") {
            fetch.set_attr("artifactOrigin", "gocd");
        }
    });
    Ok(())
}
