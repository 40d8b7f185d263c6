use crate::{MigrationContext, Result};
use cruise_xml::Element;
use tracing::debug;

fn no_op_cluster(plugin_id: &str) -> String {
    format!("no-op-cluster-for-{}", plugin_id)
}

/// Attach elastic profiles without a cluster to a generated per-plugin cluster profile.
pub(crate) fn attach_cluster_profiles(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    let Some(elastic) = root.child_mut("elastic") else {
        return Ok(());
    };
    let mut needed: Vec<String> = Vec::new();
    if let Some(profiles) = elastic.child_mut("profiles") {
        for profile in profiles.children_named_mut("profile") {
            if profile.has_attr("clusterProfileId") {
                continue;
            }
            let plugin_id = profile.attr("pluginId").unwrap_or_default().to_string();
            profile.set_attr("clusterProfileId", no_op_cluster(&plugin_id));
            if !needed.contains(&plugin_id) {
                needed.push(plugin_id);
            }
        }
    }
    if needed.is_empty() {
        return Ok(());
    }

    if elastic.child("clusterProfiles").is_none() {
        let index = elastic.position("profiles").unwrap_or(0);
        elastic.insert(index, Element::new("clusterProfiles"));
    }
    let Some(clusters) = elastic.child_mut("clusterProfiles") else {
        return Ok(());
    };
    for plugin_id in needed {
        let id = no_op_cluster(&plugin_id);
        if clusters.children_named("clusterProfile").any(|c| c.attr("id") == Some(id.as_str())) {
            continue;
        }
        debug!(cluster = %id, "creating cluster profile");
        clusters.push(
            Element::new("clusterProfile")
                .with_attr("id", id)
                .with_attr("pluginId", plugin_id),
        );
    }
    Ok(())
}
