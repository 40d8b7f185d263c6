//! Roles, policy rules, and authorization lists

use crate::{CaseInsensitiveString, Configuration, Error, Result};
use serde::Serialize;

/// A user or a role named in an authorization list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum Principal {
    User(CaseInsensitiveString),
    Role(CaseInsensitiveString),
}

/// View / operate / admin lists of a pipeline group, template or manual approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub view: Vec<Principal>,
    pub operate: Vec<Principal>,
    pub admins: Vec<Principal>,
}

impl Authorization {
    pub fn is_empty(&self) -> bool {
        self.view.is_empty() && self.operate.is_empty() && self.admins.is_empty()
    }

    /// Every role referenced by any of the three lists.
    pub fn roles(&self) -> impl Iterator<Item = &CaseInsensitiveString> {
        self.view
            .iter()
            .chain(&self.operate)
            .chain(&self.admins)
            .filter_map(|p| match p {
                Principal::Role(r) => Some(r),
                Principal::User(_) => None,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Allow,
    Deny,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Allow => "allow",
            Permission::Deny => "deny",
        }
    }
}

/// `allow|deny` x action x resource type x resource, with `*` wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRule {
    pub permission: Permission,
    pub action: String,
    pub resource_type: String,
    pub resource: String,
}

impl PolicyRule {
    pub fn allow(action: &str, resource_type: &str, resource: &str) -> Self {
        Self {
            permission: Permission::Allow,
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource: resource.to_string(),
        }
    }

    pub fn deny(action: &str, resource_type: &str, resource: &str) -> Self {
        Self {
            permission: Permission::Deny,
            ..Self::allow(action, resource_type, resource)
        }
    }

    pub fn matches(&self, action: &str, resource_type: &str, resource: &str) -> bool {
        wildcard_match(&self.action, action)
            && wildcard_match(&self.resource_type, resource_type)
            && wildcard_match(&self.resource, resource)
    }
}

/// Evaluate `rules` in order; the first matching rule decides. No match denies.
pub fn is_allowed(rules: &[PolicyRule], action: &str, resource_type: &str, resource: &str) -> bool {
    rules
        .iter()
        .find(|r| r.matches(action, resource_type, resource))
        .is_some_and(|r| r.permission == Permission::Allow)
}

/// Case-insensitive glob where `*` matches any run of characters.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let value: Vec<char> = value.to_lowercase().chars().collect();
    let (mut p, mut v) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((sp, sv)) = star {
            p = sp + 1;
            v = sv + 1;
            star = Some((sp, sv + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub name: CaseInsensitiveString,
    users: Vec<CaseInsensitiveString>,
    pub policy: Vec<PolicyRule>,
}

impl Role {
    pub fn new(name: impl Into<CaseInsensitiveString>) -> Self {
        Self {
            name: name.into(),
            users: Vec::new(),
            policy: Vec::new(),
        }
    }

    pub fn add_user(&mut self, user: impl Into<CaseInsensitiveString>) -> Result<()> {
        let user = user.into();
        if self.users.contains(&user) {
            return Err(Error::DuplicateUser {
                user: user.to_string(),
                role: self.name.to_string(),
            });
        }
        self.users.push(user);
        Ok(())
    }

    pub fn users(&self) -> &[CaseInsensitiveString] {
        &self.users
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.users.iter().any(|u| u.matches(user))
    }

    pub fn is_allowed(&self, action: &str, resource_type: &str, resource: &str) -> bool {
        is_allowed(&self.policy, action, resource_type, resource)
    }
}

/// Role whose members are resolved by an authorization plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginRole {
    pub name: CaseInsensitiveString,
    pub auth_config_id: String,
    pub configuration: Configuration,
}

impl PluginRole {
    pub fn new(name: impl Into<CaseInsensitiveString>, auth_config_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auth_config_id: auth_config_id.into(),
            configuration: Configuration::new(),
        }
    }
}

/// Authorization plugin settings that plugin roles refer to by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityAuthConfig {
    pub id: String,
    pub plugin_id: String,
    pub configuration: Configuration,
}

impl SecurityAuthConfig {
    pub fn new(id: impl Into<String>, plugin_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugin_id: plugin_id.into(),
            configuration: Configuration::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityConfig {
    pub auth_configs: Vec<SecurityAuthConfig>,
    pub roles: Vec<Role>,
    pub plugin_roles: Vec<PluginRole>,
    pub admins: Vec<Principal>,
}

impl SecurityConfig {
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name.matches(name))
    }

    pub fn plugin_role(&self, name: &str) -> Option<&PluginRole> {
        self.plugin_roles.iter().find(|r| r.name.matches(name))
    }

    /// Names of user and plugin roles alike.
    pub fn role_names(&self) -> impl Iterator<Item = &CaseInsensitiveString> {
        self.roles
            .iter()
            .map(|r| &r.name)
            .chain(self.plugin_roles.iter().map(|r| &r.name))
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.role_names().any(|r| r.matches(name))
    }

    pub fn auth_config(&self, id: &str) -> Option<&SecurityAuthConfig> {
        self.auth_configs.iter().find(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.auth_configs.is_empty() && self.roles.is_empty() && self.plugin_roles.is_empty() && self.admins.is_empty()
    }

    /// Roles the user belongs to.
    pub fn roles_for_user<'a>(&'a self, user: &'a str) -> impl Iterator<Item = &'a Role> {
        self.roles.iter().filter(move |r| r.has_user(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*", "anything", true)]
    #[case("dev-*", "dev-uat", true)]
    #[case("dev-*", "prod", false)]
    #[case("*-uat", "DEV-UAT", true)]
    #[case("a*b*c", "axxbyyc", true)]
    #[case("a*b*c", "axxbyy", false)]
    #[case("exact", "exact", true)]
    fn test_wildcard_match(#[case] pattern: &str, #[case] value: &str, #[case] expected: bool) {
        assert_eq!(wildcard_match(pattern, value), expected);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            PolicyRule::deny("view", "environment", "prod-*"),
            PolicyRule::allow("*", "environment", "*"),
        ];
        assert!(!is_allowed(&rules, "view", "environment", "prod-eu"));
        assert!(is_allowed(&rules, "view", "environment", "uat"));
        assert!(!is_allowed(&rules, "view", "pipeline_group", "uat"));
    }

    #[test]
    fn test_plugin_roles_count_as_roles() {
        let mut security = SecurityConfig::default();
        security.roles.push(Role::new("dev"));
        security.plugin_roles.push(PluginRole::new("blackbird", "github"));

        assert!(security.has_role("BLACKBIRD"));
        assert!(security.has_role("dev"));
        assert!(!security.has_role("ops"));
        assert_eq!(security.role_names().count(), 2);
        assert!(security.role("blackbird").is_none());
    }

    #[test]
    fn test_duplicate_user_in_role() {
        let mut role = Role::new("admin");
        role.add_user("ps").unwrap();
        let err = role.add_user("PS").unwrap_err();
        assert_eq!(err.to_string(), "User 'PS' already exists in 'admin'.");
    }
}
