//! Server-wide settings

use crate::{PropertyValue, SecurityConfig};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub artifacts_dir: Option<String>,
    /// Default job timeout in minutes.
    pub job_timeout: Option<String>,
    pub site_url: Option<String>,
    pub security: SecurityConfig,
    pub mail_host: Option<MailHost>,
    pub purge: PurgeSettings,
}

impl ServerConfig {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// SMTP server used for notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailHost {
    pub hostname: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<PropertyValue>,
    pub tls: bool,
    pub from: String,
    pub admin: String,
}

impl MailHost {
    pub fn new(hostname: impl Into<String>, port: u16, from: impl Into<String>, admin: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            username: None,
            password: None,
            tls: false,
            from: from.into(),
            admin: admin.into(),
        }
    }
}

/// Artifact cleanup thresholds in gigabytes of free disk space.
///
/// Cleanup starts when free space drops below `start` and removes artifacts
/// until `upto` is free again. Values are always finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PurgeSettings {
    pub start: Option<f64>,
    pub upto: Option<f64>,
}

impl Eq for PurgeSettings {}

impl PurgeSettings {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.upto.is_none()
    }
}
