//! Authorization lists, roles and policies

use crate::property::{read_properties, text_element, write_properties};
use crate::schema::{
    any_number, at_least_one, check_attrs, check_enum, check_sequence, name_attr, optional, require_attr,
    require_entity_attr, text_of,
};
use crate::{Error, Result};
use cruise_model::{Authorization, PluginRole, PolicyRule, Principal, Role, SecurityAuthConfig, SecurityConfig};
use cruise_xml::Element;

/// Read `<user>` and `<role>` children. At least one is required.
pub(crate) fn read_principals(element: &Element) -> Result<Vec<Principal>> {
    check_sequence(element, &[at_least_one(&["user", "role"])])?;
    element
        .elements()
        .map(|child| {
            let name = text_of(child).ok_or_else(|| {
                Error::structural(
                    &child.name,
                    format!(
                        "Value '' with length = '0' is not facet-valid with respect to minLength '1' for type '{}'.",
                        child.name
                    ),
                )
            })?;
            Ok(if child.name == "role" {
                Principal::Role(name.into())
            } else {
                Principal::User(name.into())
            })
        })
        .collect()
}

pub(crate) fn write_principals(parent: &mut Element, principals: &[Principal]) {
    for principal in principals {
        parent.push(match principal {
            Principal::User(name) => text_element("user", name.as_str()),
            Principal::Role(name) => text_element("role", name.as_str()),
        });
    }
}

/// Read the `<authorization>` of a pipeline group or template.
pub(crate) fn read_authorization(parent: &Element) -> Result<Authorization> {
    let Some(element) = parent.child("authorization") else {
        return Ok(Authorization::default());
    };
    check_attrs(element, &[])?;
    check_sequence(
        element,
        &[optional(&["view"]), optional(&["operate"]), optional(&["admins"])],
    )?;
    let list = |name: &str| -> Result<Vec<Principal>> {
        match element.child(name) {
            Some(child) => {
                check_attrs(child, &[])?;
                read_principals(child)
            }
            None => Ok(Vec::new()),
        }
    };
    Ok(Authorization {
        view: list("view")?,
        operate: list("operate")?,
        admins: list("admins")?,
    })
}

pub(crate) fn write_authorization(parent: &mut Element, authorization: &Authorization) {
    if authorization.is_empty() {
        return;
    }
    let mut element = Element::new("authorization");
    for (name, principals) in [
        ("view", &authorization.view),
        ("operate", &authorization.operate),
        ("admins", &authorization.admins),
    ] {
        if !principals.is_empty() {
            let mut child = Element::new(name);
            write_principals(&mut child, principals);
            element.push(child);
        }
    }
    parent.push(element);
}

const PERMISSIONS: [&str; 2] = ["allow", "deny"];

/// Read `<allow>`/`<deny>` children as policy rules.
pub(crate) fn read_rules(element: &Element) -> Result<Vec<PolicyRule>> {
    check_sequence(element, &[any_number(&PERMISSIONS)])?;
    element
        .elements()
        .map(|rule| {
            check_attrs(rule, &["action", "type"])?;
            let action = require_attr(rule, "action")?;
            let resource_type = require_attr(rule, "type")?;
            let resource = text_of(rule).unwrap_or_default();
            Ok(match check_enum(rule, &rule.name, &PERMISSIONS)? {
                "deny" => PolicyRule::deny(action, resource_type, &resource),
                _ => PolicyRule::allow(action, resource_type, &resource),
            })
        })
        .collect()
}

pub(crate) fn write_rules(parent: &mut Element, rules: &[PolicyRule]) {
    for rule in rules {
        parent.push(
            text_element(rule.permission.as_str(), &rule.resource)
                .with_attr("action", &rule.action)
                .with_attr("type", &rule.resource_type),
        );
    }
}

pub(crate) fn read_security(element: &Element) -> Result<SecurityConfig> {
    check_attrs(element, &[])?;
    check_sequence(
        element,
        &[optional(&["authConfigs"]), optional(&["roles"]), optional(&["admins"])],
    )?;
    let mut security = SecurityConfig::default();
    if let Some(auth_configs) = element.child("authConfigs") {
        check_attrs(auth_configs, &[])?;
        check_sequence(auth_configs, &[any_number(&["authConfig"])])?;
        for auth_config in auth_configs.children_named("authConfig") {
            security.auth_configs.push(read_auth_config(auth_config)?);
        }
    }
    if let Some(roles) = element.child("roles") {
        check_attrs(roles, &[])?;
        check_sequence(roles, &[at_least_one(&["role", "pluginRole"])])?;
        for role in roles.elements() {
            if role.is("pluginRole") {
                security.plugin_roles.push(read_plugin_role(role)?);
            } else {
                security.roles.push(read_role(role)?);
            }
        }
    }
    if let Some(admins) = element.child("admins") {
        check_attrs(admins, &[])?;
        security.admins = read_principals(admins)?;
    }
    Ok(security)
}

pub(crate) fn read_role(element: &Element) -> Result<Role> {
    check_attrs(element, &["name"])?;
    check_sequence(element, &[optional(&["users"]), optional(&["policy"])])?;
    let mut role = Role::new(name_attr(element, "name", "Name")?);
    if let Some(users) = element.child("users") {
        check_attrs(users, &[])?;
        check_sequence(users, &[any_number(&["user"])])?;
        for user in users.children_named("user") {
            if let Some(name) = text_of(user) {
                role.add_user(name)?;
            }
        }
    }
    if let Some(policy) = element.child("policy") {
        check_attrs(policy, &[])?;
        role.policy = read_rules(policy)?;
    }
    Ok(role)
}

pub(crate) fn read_auth_config(element: &Element) -> Result<SecurityAuthConfig> {
    check_attrs(element, &["id", "pluginId"])?;
    check_sequence(element, &[any_number(&["property"])])?;
    Ok(SecurityAuthConfig {
        id: require_entity_attr(element, "id", "Id", "SecurityAuthConfig")?.to_string(),
        plugin_id: require_entity_attr(element, "pluginId", "Plugin id", "SecurityAuthConfig")?.to_string(),
        configuration: read_properties(element)?,
    })
}

pub(crate) fn write_auth_config(auth_config: &SecurityAuthConfig) -> Element {
    let mut element = Element::new("authConfig")
        .with_attr("id", &auth_config.id)
        .with_attr("pluginId", &auth_config.plugin_id);
    write_properties(&mut element, &auth_config.configuration);
    element
}

pub(crate) fn read_plugin_role(element: &Element) -> Result<PluginRole> {
    check_attrs(element, &["name", "authConfigId"])?;
    check_sequence(element, &[any_number(&["property"])])?;
    let mut role = PluginRole::new(
        name_attr(element, "name", "Name")?,
        name_attr(element, "authConfigId", "Auth config id")?,
    );
    role.configuration = read_properties(element)?;
    Ok(role)
}

pub(crate) fn write_plugin_role(role: &PluginRole) -> Element {
    let mut element = Element::new("pluginRole")
        .with_attr("name", role.name.as_str())
        .with_attr("authConfigId", &role.auth_config_id);
    write_properties(&mut element, &role.configuration);
    element
}

pub(crate) fn write_role(role: &Role) -> Element {
    let mut element = Element::new("role").with_attr("name", role.name.as_str());
    if !role.users().is_empty() {
        let mut users = Element::new("users");
        for user in role.users() {
            users.push(text_element("user", user.as_str()));
        }
        element.push(users);
    }
    if !role.policy.is_empty() {
        let mut policy = Element::new("policy");
        write_rules(&mut policy, &role.policy);
        element.push(policy);
    }
    element
}

pub(crate) fn write_security(security: &SecurityConfig) -> Option<Element> {
    if security.is_empty() {
        return None;
    }
    let mut element = Element::new("security");
    if !security.auth_configs.is_empty() {
        let mut auth_configs = Element::new("authConfigs");
        for auth_config in &security.auth_configs {
            auth_configs.push(write_auth_config(auth_config));
        }
        element.push(auth_configs);
    }
    if !security.roles.is_empty() || !security.plugin_roles.is_empty() {
        let mut roles = Element::new("roles");
        for role in &security.roles {
            roles.push(write_role(role));
        }
        for role in &security.plugin_roles {
            roles.push(write_plugin_role(role));
        }
        element.push(roles);
    }
    if !security.admins.is_empty() {
        let mut admins = Element::new("admins");
        write_principals(&mut admins, &security.admins);
        element.push(admins);
    }
    Some(element)
}
