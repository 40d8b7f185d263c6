//! The `<cruise>` root: whole documents and config-repo partials

use crate::environment::{read_environments, write_environment};
use crate::material::{read_password, write_password};
use crate::pipeline::{read_group, read_templates, write_group, write_template};
use crate::plugin::{
    read_artifact_stores, read_config_repos, read_elastic, read_repositories, read_scms, read_secret_configs,
    write_artifact_store, write_config_repo, write_elastic, write_repository, write_scm, write_secret_config,
};
use crate::property::text_element;
use crate::schema::{
    IdentityConstraint, any_number, bool_attr, check_attrs, check_sequence, optional, require_attr, text_of,
};
use crate::security::{read_security, write_security};
use crate::{DocumentCodec, Error, Result};
use cruise_model::{
    CURRENT_SCHEMA_VERSION, ConfigurationDocument, MailHost, PartialConfig, PurgeSettings, RepoOrigin, ServerConfig,
};
use cruise_xml::Element;
use tracing::debug;

pub(crate) const ROOT: &str = "cruise";

const ROOT_ATTRS: &[&str] = &["schemaVersion", "xmlns:xsi", "xsi:noNamespaceSchemaLocation"];

const ROOT_SEQUENCE: &[crate::schema::Particle] = &[
    optional(&["server"]),
    optional(&["config-repos"]),
    optional(&["elastic"]),
    optional(&["artifactStores"]),
    optional(&["secretConfigs"]),
    optional(&["repositories"]),
    optional(&["scms"]),
    any_number(&["pipelines"]),
    optional(&["templates"]),
    optional(&["environments"]),
];

const PARTIAL_SEQUENCE: &[crate::schema::Particle] = &[
    any_number(&["pipelines"]),
    optional(&["templates"]),
    optional(&["environments"]),
];

fn expect_root(root: &Element) -> Result<()> {
    if root.is(ROOT) {
        return Ok(());
    }
    Err(Error::structural(
        &root.name,
        format!("Cannot find the declaration of element '{}'.", root.name),
    ))
}

/// Version declared on the root; the codec only reads the current version.
fn check_version(root: &Element) -> Result<u32> {
    let declared = root.attr("schemaVersion").ok_or_else(|| {
        Error::structural(ROOT, "Attribute 'schemaVersion' must appear on element 'cruise'.")
    })?;
    match declared.trim().parse::<u32>() {
        Ok(version) if version == CURRENT_SCHEMA_VERSION => Ok(version),
        _ => Err(Error::VersionMismatch {
            found: declared.to_string(),
            expected: CURRENT_SCHEMA_VERSION,
        }),
    }
}

impl DocumentCodec<'_> {
    /// Parse the bytes of a current-version document.
    pub fn parse_document(&self, bytes: &[u8]) -> Result<ConfigurationDocument> {
        let root = cruise_xml::parse_bytes(bytes)?;
        self.read_document(&root)
    }

    /// Build a document from an already parsed tree, e.g. the output of migration.
    pub fn read_document(&self, root: &Element) -> Result<ConfigurationDocument> {
        expect_root(root)?;
        check_attrs(root, ROOT_ATTRS)?;
        let schema_version = check_version(root)?;
        check_sequence(root, ROOT_SEQUENCE)?;

        let mut doc = ConfigurationDocument {
            schema_version,
            ..ConfigurationDocument::default()
        };
        if let Some(server) = root.child("server") {
            doc.server = read_server(self, server)?;
        }
        if let Some(repos) = root.child("config-repos") {
            doc.config_repos = read_config_repos(self, repos)?;
        }
        if let Some(elastic) = root.child("elastic") {
            doc.elastic = read_elastic(elastic)?;
        }
        if let Some(stores) = root.child("artifactStores") {
            doc.artifact_stores = read_artifact_stores(stores)?;
        }
        if let Some(secrets) = root.child("secretConfigs") {
            doc.secret_configs = read_secret_configs(secrets)?;
        }
        let mut package_ids = IdentityConstraint::new(ROOT);
        if let Some(repositories) = root.child("repositories") {
            doc.repositories = read_repositories(repositories, &mut package_ids)?;
        }
        if let Some(scms) = root.child("scms") {
            doc.scms = read_scms(scms)?;
        }
        for group in root.children_named("pipelines") {
            doc.groups.push(read_group(self, group)?);
        }
        if let Some(templates) = root.child("templates") {
            doc.templates = read_templates(self, templates)?;
        }
        if let Some(environments) = root.child("environments") {
            doc.environments = read_environments(self, environments)?;
        }
        debug!(
            groups = doc.groups.len(),
            templates = doc.templates.len(),
            environments = doc.environments.len(),
            "parsed configuration document"
        );
        Ok(doc)
    }

    /// Parse a config-repo fragment and tag everything in it with `origin`.
    pub fn parse_partial(&self, bytes: &[u8], origin: RepoOrigin) -> Result<PartialConfig> {
        let root = cruise_xml::parse_bytes(bytes)?;
        expect_root(&root)?;
        check_attrs(&root, ROOT_ATTRS)?;
        check_sequence(&root, PARTIAL_SEQUENCE)?;

        let mut partial = PartialConfig::new(origin.clone());
        for group in root.children_named("pipelines") {
            partial.groups.push(read_group(self, group)?);
        }
        if let Some(templates) = root.child("templates") {
            partial.templates = read_templates(self, templates)?;
        }
        if let Some(environments) = root.child("environments") {
            partial.environments = read_environments(self, environments)?;
        }
        partial.set_origin(origin);
        Ok(partial)
    }
}

fn read_server(codec: &DocumentCodec<'_>, element: &Element) -> Result<ServerConfig> {
    check_attrs(element, &["artifactsdir", "jobTimeout", "siteUrl"])?;
    check_sequence(
        element,
        &[optional(&["security"]), optional(&["mailhost"]), optional(&["artifacts"])],
    )?;
    Ok(ServerConfig {
        artifacts_dir: element.attr("artifactsdir").map(str::to_string),
        job_timeout: element.attr("jobTimeout").map(str::to_string),
        site_url: element.attr("siteUrl").map(str::to_string),
        security: element.child("security").map(read_security).transpose()?.unwrap_or_default(),
        mail_host: element.child("mailhost").map(|m| read_mail_host(codec, m)).transpose()?,
        purge: element.child("artifacts").map(read_purge_settings).transpose()?.unwrap_or_default(),
    })
}

fn read_mail_host(codec: &DocumentCodec<'_>, element: &Element) -> Result<MailHost> {
    check_attrs(
        element,
        &["hostname", "port", "username", "password", "encryptedPassword", "tls", "from", "admin"],
    )?;
    check_sequence(element, &[])?;
    let port = require_attr(element, "port")?;
    let port = port.trim().parse::<u16>().map_err(|_| {
        Error::structural("mailhost", format!("'{}' is not a valid value for 'int'.", port))
    })?;
    Ok(MailHost {
        hostname: require_attr(element, "hostname")?.to_string(),
        port,
        username: element.attr("username").map(str::to_string),
        password: read_password(codec, element)?,
        tls: bool_attr(element, "tls", false)?,
        from: require_attr(element, "from")?.to_string(),
        admin: require_attr(element, "admin")?.to_string(),
    })
}

fn read_purge_settings(element: &Element) -> Result<PurgeSettings> {
    check_attrs(element, &[])?;
    check_sequence(element, &[optional(&["purgeSettings"])])?;
    let Some(settings) = element.child("purgeSettings") else {
        return Ok(PurgeSettings::default());
    };
    check_attrs(settings, &[])?;
    check_sequence(
        settings,
        &[optional(&["purgeStartDiskSpace"]), optional(&["purgeUptoDiskSpace"])],
    )?;
    let disk_space = |name: &str| -> Result<Option<f64>> {
        let Some(child) = settings.child(name) else {
            return Ok(None);
        };
        let text = text_of(child).unwrap_or_default();
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(Error::structural(
                name,
                format!("'{}' is not a valid value for 'double'.", text),
            )),
        }
    };
    Ok(PurgeSettings {
        start: disk_space("purgeStartDiskSpace")?,
        upto: disk_space("purgeUptoDiskSpace")?,
    })
}

fn write_server(server: &ServerConfig) -> Element {
    let mut element = Element::new("server");
    element.set_opt_attr("artifactsdir", server.artifacts_dir.as_deref());
    element.set_opt_attr("jobTimeout", server.job_timeout.as_deref());
    element.set_opt_attr("siteUrl", server.site_url.as_deref());
    if let Some(security) = write_security(&server.security) {
        element.push(security);
    }
    if let Some(mail_host) = &server.mail_host {
        element.push(write_mail_host(mail_host));
    }
    if !server.purge.is_empty() {
        let mut settings = Element::new("purgeSettings");
        for (name, value) in [
            ("purgeStartDiskSpace", server.purge.start),
            ("purgeUptoDiskSpace", server.purge.upto),
        ] {
            if let Some(value) = value {
                settings.push(text_element(name, &value.to_string()));
            }
        }
        element.push(Element::new("artifacts").with_child(settings));
    }
    element
}

fn write_mail_host(mail_host: &MailHost) -> Element {
    let mut element = Element::new("mailhost")
        .with_attr("hostname", &mail_host.hostname)
        .with_attr("port", mail_host.port.to_string());
    element.set_opt_attr("username", mail_host.username.as_deref());
    write_password(&mut element, mail_host.password.as_ref());
    element.set_attr("tls", mail_host.tls.to_string());
    element.set_attr("from", &mail_host.from);
    element.set_attr("admin", &mail_host.admin);
    element
}

fn list<T>(name: &str, items: &[T], write: impl Fn(&T) -> Element) -> Option<Element> {
    if items.is_empty() {
        return None;
    }
    let mut element = Element::new(name);
    for item in items {
        element.push(write(item));
    }
    Some(element)
}

/// The canonical tree of `doc`, stamped with the current schema version.
pub fn to_element(doc: &ConfigurationDocument) -> Element {
    let mut root = Element::new(ROOT).with_attr("schemaVersion", CURRENT_SCHEMA_VERSION.to_string());
    if !doc.server.is_empty() {
        root.push(write_server(&doc.server));
    }
    let sections = [
        list("config-repos", &doc.config_repos, write_config_repo),
        (!doc.elastic.is_empty()).then(|| write_elastic(&doc.elastic)),
        list("artifactStores", &doc.artifact_stores, write_artifact_store),
        list("secretConfigs", &doc.secret_configs, write_secret_config),
        list("repositories", &doc.repositories, write_repository),
        list("scms", &doc.scms, write_scm),
    ];
    for section in sections.into_iter().flatten() {
        root.push(section);
    }
    write_tail(&mut root, &doc.groups, &doc.templates, &doc.environments);
    root
}

fn write_tail(
    root: &mut Element,
    groups: &[cruise_model::PipelineGroup],
    templates: &[cruise_model::Template],
    environments: &[cruise_model::EnvironmentConfig],
) {
    for group in groups {
        root.push(write_group(group));
    }
    if let Some(templates) = list("templates", templates, write_template) {
        root.push(templates);
    }
    if let Some(environments) = list("environments", environments, write_environment) {
        root.push(environments);
    }
}

/// Serialize `doc` in canonical form.
pub fn serialize(doc: &ConfigurationDocument) -> String {
    cruise_xml::write_document(&to_element(doc))
}

/// Serialize a config-repo fragment. Origins are not part of the wire form.
pub fn serialize_partial(partial: &PartialConfig) -> String {
    let mut root = Element::new(ROOT).with_attr("schemaVersion", CURRENT_SCHEMA_VERSION.to_string());
    write_tail(&mut root, &partial.groups, &partial.templates, &partial.environments);
    cruise_xml::write_document(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(body: &str) -> String {
        format!(r#"<cruise schemaVersion="{}">{}</cruise>"#, CURRENT_SCHEMA_VERSION, body)
    }

    #[test]
    fn test_empty_document() {
        let parsed = DocumentCodec::new().parse_document(doc("").as_bytes()).unwrap();
        assert_eq!(parsed, ConfigurationDocument::new());
        assert_eq!(
            serialize(&parsed),
            format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<cruise schemaVersion=\"{}\" />\n", CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_old_version_is_rejected() {
        let err = DocumentCodec::new()
            .parse_document(br#"<cruise schemaVersion="88" />"#)
            .unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { ref found, .. } if found == "88"));
    }

    #[test]
    fn test_children_out_of_order() {
        let err = DocumentCodec::new()
            .parse_document(doc("<environments /><server />").as_bytes())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid content was found starting with element 'server'. No child element is expected at this point."
        );
    }

    #[test]
    fn test_unknown_child() {
        let err = DocumentCodec::new().parse_document(doc("<agents />").as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid content was found starting with element 'agents'."));
    }

    #[test]
    fn test_duplicate_package_ids_across_repositories() {
        let repo = |id: &str| {
            format!(
                r#"<repository id="{id}" name="{id}"><pluginConfiguration id="deb" version="1" /><configuration /><packages><package id="pkg" name="p"><configuration /></package></packages></repository>"#
            )
        };
        let xml = doc(&format!("<repositories>{}{}</repositories>", repo("a"), repo("b")));
        let err = DocumentCodec::new().parse_document(xml.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate unique value [pkg] declared for identity constraint of element \"cruise\"."
        );
    }

    #[test]
    fn test_server_security() {
        let xml = doc(
            r#"<server artifactsdir="artifacts" siteUrl="https://ci.example.com"><security><roles><role name="admins"><users><user>ann</user></users></role></roles></security></server>"#,
        );
        let parsed = DocumentCodec::new().parse_document(xml.as_bytes()).unwrap();
        assert_eq!(parsed.server.artifacts_dir.as_deref(), Some("artifacts"));
        assert!(parsed.server.security.role("ADMINS").unwrap().has_user("ann"));
    }

    #[rstest::rstest]
    #[case("1", "3", 1.0, 3.0)]
    #[case("1.2", "3.4", 1.2, 3.4)]
    fn test_purge_settings(#[case] start: &str, #[case] upto: &str, #[case] start_gb: f64, #[case] upto_gb: f64) {
        let xml = doc(&format!(
            "<server><artifacts><purgeSettings><purgeStartDiskSpace>{start}</purgeStartDiskSpace><purgeUptoDiskSpace>{upto}</purgeUptoDiskSpace></purgeSettings></artifacts></server>"
        ));
        let parsed = DocumentCodec::new().parse_document(xml.as_bytes()).unwrap();
        assert_eq!(parsed.server.purge.start, Some(start_gb));
        assert_eq!(parsed.server.purge.upto, Some(upto_gb));

        let reparsed = DocumentCodec::new().parse_document(serialize(&parsed).as_bytes()).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn test_purge_settings_absent() {
        let parsed = DocumentCodec::new().parse_document(doc("<server />").as_bytes()).unwrap();
        assert_eq!(parsed.server.purge.start, None);
        assert_eq!(parsed.server.purge.upto, None);
    }

    #[test]
    fn test_purge_value_must_be_a_number() {
        let xml = doc("<server><artifacts><purgeSettings><purgeStartDiskSpace>lots</purgeStartDiskSpace></purgeSettings></artifacts></server>");
        let err = DocumentCodec::new().parse_document(xml.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "'lots' is not a valid value for 'double'.");
    }

    #[test]
    fn test_mail_host() {
        let xml = doc(
            r#"<server><mailhost hostname="smtp.example.com" port="25" username="user" encryptedPassword="AES:a:b" tls="true" from="ci@example.com" admin="ops@example.com" /></server>"#,
        );
        let parsed = DocumentCodec::new().parse_document(xml.as_bytes()).unwrap();
        let mail_host = parsed.server.mail_host.as_ref().unwrap();
        assert_eq!(mail_host.hostname, "smtp.example.com");
        assert_eq!(mail_host.port, 25);
        assert!(mail_host.tls);
        assert_eq!(mail_host.password, Some(cruise_model::PropertyValue::Encrypted("AES:a:b".into())));

        let reparsed = DocumentCodec::new().parse_document(serialize(&parsed).as_bytes()).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn test_mail_host_requires_sender() {
        let xml = doc(r#"<server><mailhost hostname="h" port="25" admin="a@example.com" /></server>"#);
        let err = DocumentCodec::new().parse_document(xml.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Attribute 'from' must appear on element 'mailhost'.");
    }

    #[test]
    fn test_partial_tags_origin() {
        let xml = r#"<cruise><pipelines group="remote"><pipeline name="up"><materials><git url="u" /></materials><stage name="s"><jobs><job name="j" /></jobs></stage></pipeline></pipelines></cruise>"#;
        let partial = DocumentCodec::new()
            .parse_partial(xml.as_bytes(), RepoOrigin::new("abc"))
            .unwrap();
        assert!(partial.groups[0].pipelines()[0].origin.is_repo());
    }

    #[test]
    fn test_partial_rejects_server() {
        let err = DocumentCodec::new()
            .parse_partial(b"<cruise><server /></cruise>", RepoOrigin::new("abc"))
            .unwrap_err();
        assert!(err.is_structural());
    }
}
