use crate::{MigrationContext, Result};
use cruise_xml::Element;
use uuid::Uuid;

/// Deterministic id for an entity without one, derived from its names.
fn derived_id(kind: &str, names: &[&str]) -> String {
    let name = format!("{}:{}", kind, names.join("/"));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Give package repositories and packages without an `id` a stable one.
pub(crate) fn assign_ids(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    let Some(repositories) = root.child_mut("repositories") else {
        return Ok(());
    };
    for repository in repositories.children_named_mut("repository") {
        let repo_name = repository.attr("name").unwrap_or_default().to_string();
        if !repository.has_attr("id") {
            repository.set_attr("id", derived_id("repository", &[&repo_name]));
        }
        let Some(packages) = repository.child_mut("packages") else {
            continue;
        };
        for package in packages.children_named_mut("package") {
            if !package.has_attr("id") {
                let package_name = package.attr("name").unwrap_or_default().to_string();
                package.set_attr("id", derived_id("package", &[&repo_name, &package_name]));
            }
        }
    }
    Ok(())
}
