//! Roles, auth configs and the authorization lists that name them.

use super::{Context, repeated};
use crate::error::{Report, path};
use cruise_model::{CaseInsensitiveString, Principal, SecurityConfig};
use std::collections::HashSet;

pub(crate) fn check(ctx: &Context<'_>, report: &mut Report) {
    let doc = ctx.doc;
    let security = &doc.server.security;

    if !repeated(security.role_names(), |name| name).is_empty() {
        report.add("security/roles", "Role names should be unique. Duplicate names found.");
    }

    let mut seen = HashSet::new();
    for auth_config in &security.auth_configs {
        if !seen.insert(auth_config.id.as_str()) {
            report.add(
                format!("security/{}", path(&[("authConfig", &auth_config.id)])),
                format!("Security auth config id '{}' is not unique", auth_config.id),
            );
        }
    }
    for role in &security.plugin_roles {
        if security.auth_config(&role.auth_config_id).is_none() {
            report.add(
                format!("security/{}", path(&[("pluginRole", role.name.as_str())])),
                format!(
                    "No such security auth configuration present for id: `{}`",
                    role.auth_config_id
                ),
            );
        }
    }

    let admins = security.admins.iter().filter_map(|p| match p {
        Principal::Role(role) => Some(role),
        Principal::User(_) => None,
    });
    unknown_roles(security, "security/admins".to_string(), admins, report);

    for group in &doc.groups {
        let at = path(&[("group", group.name.as_str())]);
        unknown_roles(security, at, group.authorization.roles(), report);
        for pipeline in group.pipelines() {
            for stage in pipeline.stages() {
                let at = path(&[("pipeline", pipeline.name.as_str()), ("stage", stage.name.as_str())]);
                unknown_roles(security, at, stage.approval.authorization.roles(), report);
            }
        }
    }
    for template in &doc.templates {
        let at = path(&[("template", template.name.as_str())]);
        unknown_roles(security, at.clone(), template.authorization.roles(), report);
        // Parameterised roles are checked in the pipelines that expand the template.
        for stage in template.stages() {
            let at = format!("{at}/{}", path(&[("stage", stage.name.as_str())]));
            let roles = stage
                .approval
                .authorization
                .roles()
                .filter(|role| !role.as_str().contains("#{"));
            unknown_roles(security, at, roles, report);
        }
    }
}

fn unknown_roles<'a>(
    security: &SecurityConfig,
    at: String,
    roles: impl Iterator<Item = &'a CaseInsensitiveString>,
    report: &mut Report,
) {
    for role in roles {
        if !security.has_role(role.as_str()) {
            report.add(at.clone(), format!("Role \"{role}\" does not exist."));
        }
    }
}
