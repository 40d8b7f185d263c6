//! Plugin properties, environment variables and parameters

use crate::DocumentCodec;
use crate::schema::{
    any_number, at_least_one, bool_attr, check_attrs, check_sequence, name_attr, optional, required, require_attr,
    text_of,
};
use crate::{Error, Result};
use cruise_model::{
    Configuration, ConfigurationProperty, EnvironmentVariable, Param, PluginConfiguration, PropertyValue,
};
use cruise_xml::Element;

/// Read `<property>` children of `parent`.
pub(crate) fn read_properties(parent: &Element) -> Result<Configuration> {
    let mut configuration = Configuration::new();
    for element in parent.children_named("property") {
        configuration.add(read_property(element)?)?;
    }
    Ok(configuration)
}

/// Read an optional `<configuration>` child holding properties.
pub(crate) fn read_configuration(parent: &Element) -> Result<Configuration> {
    match parent.child("configuration") {
        Some(element) => {
            check_attrs(element, &[])?;
            check_sequence(element, &[any_number(&["property"])])?;
            read_properties(element)
        }
        None => Ok(Configuration::new()),
    }
}

fn read_property(element: &Element) -> Result<ConfigurationProperty> {
    check_attrs(element, &[])?;
    check_sequence(element, &[required(&["key"]), optional(&["value", "encryptedValue"])])?;
    let key = element
        .child("key")
        .and_then(text_of)
        .ok_or_else(|| Error::structural("key", "Configuration property key cannot be empty."))?;
    let property = match (element.child("value"), element.child("encryptedValue")) {
        (_, Some(token)) => ConfigurationProperty::encrypted(key, token.text().trim()),
        (Some(value), None) => ConfigurationProperty::plain(key, value.text()),
        (None, None) => ConfigurationProperty::plain(key, ""),
    };
    Ok(property)
}

pub(crate) fn write_properties(parent: &mut Element, configuration: &Configuration) {
    for property in configuration.iter() {
        let mut element = Element::new("property").with_child(Element::new("key").with_text(&property.key));
        element.push(match &property.value {
            PropertyValue::Plain(v) => text_element("value", v),
            PropertyValue::Encrypted(token) => text_element("encryptedValue", token),
        });
        parent.push(element);
    }
}

/// Write a `<configuration>` child. Empty configurations are written too, as
/// some entities require the element.
pub(crate) fn write_configuration(parent: &mut Element, configuration: &Configuration) {
    let mut element = Element::new("configuration");
    write_properties(&mut element, configuration);
    parent.push(element);
}

pub(crate) fn read_plugin_configuration(parent: &Element) -> Result<PluginConfiguration> {
    let element = parent.child("pluginConfiguration").ok_or_else(|| {
        Error::structural(
            &parent.name,
            format!(
                "The content of element '{}' is not complete. One of '{{pluginConfiguration}}' is expected.",
                parent.name
            ),
        )
    })?;
    check_attrs(element, &["id", "version"])?;
    Ok(PluginConfiguration::new(
        require_attr(element, "id")?,
        require_attr(element, "version")?,
    ))
}

pub(crate) fn write_plugin_configuration(parent: &mut Element, plugin: &PluginConfiguration) {
    parent.push(
        Element::new("pluginConfiguration")
            .with_attr("id", &plugin.id)
            .with_attr("version", &plugin.version),
    );
}

/// Read `<environmentvariables>` of `parent`, if present.
pub(crate) fn read_variables(codec: &DocumentCodec<'_>, parent: &Element) -> Result<Vec<EnvironmentVariable>> {
    let Some(list) = parent.child("environmentvariables") else {
        return Ok(Vec::new());
    };
    check_attrs(list, &[])?;
    check_sequence(list, &[any_number(&["variable"])])?;
    list.children_named("variable")
        .map(|element| read_variable(codec, element))
        .collect()
}

fn read_variable(codec: &DocumentCodec<'_>, element: &Element) -> Result<EnvironmentVariable> {
    check_attrs(element, &["name", "secure"])?;
    check_sequence(element, &[optional(&["value", "encryptedValue"])])?;
    let name = require_attr(element, "name")?;
    let secure = bool_attr(element, "secure", false)?;

    if let Some(token) = element.child("encryptedValue") {
        return Ok(EnvironmentVariable::encrypted(name, token.text().trim()));
    }
    let value = element.child("value").map(Element::text).unwrap_or_default();
    if !secure {
        return Ok(EnvironmentVariable::plain(name, value));
    }
    let cipher = codec.cipher().ok_or_else(|| {
        Error::structural(
            "variable",
            format!("Secure variable '{}' has a plain value and no cipher is available to encrypt it.", name),
        )
    })?;
    Ok(EnvironmentVariable::secure(name, &value, cipher)?)
}

pub(crate) fn write_variables<'a>(parent: &mut Element, variables: impl IntoIterator<Item = &'a EnvironmentVariable>) {
    let mut list = Element::new("environmentvariables");
    for variable in variables {
        let mut element = Element::new("variable").with_attr("name", variable.name.as_str());
        match &variable.value {
            PropertyValue::Plain(v) => element.push(text_element("value", v)),
            PropertyValue::Encrypted(token) => {
                element.set_attr("secure", "true");
                element.push(text_element("encryptedValue", token));
            }
        }
        list.push(element);
    }
    if list.has_element_children() {
        parent.push(list);
    }
}

pub(crate) fn read_params(parent: &Element) -> Result<Vec<Param>> {
    let Some(list) = parent.child("params") else {
        return Ok(Vec::new());
    };
    check_attrs(list, &[])?;
    check_sequence(list, &[at_least_one(&["param"])])?;
    list.children_named("param")
        .map(|element| {
            check_attrs(element, &["name"])?;
            Ok(Param {
                name: name_attr(element, "name", "Parameter name")?.into(),
                value: element.text(),
            })
        })
        .collect()
}

pub(crate) fn write_params(parent: &mut Element, params: &[Param]) {
    if params.is_empty() {
        return;
    }
    let mut list = Element::new("params");
    for param in params {
        list.push(text_element("param", &param.value).with_attr("name", param.name.as_str()));
    }
    parent.push(list);
}

/// Element whose only content is `text`; self-closing when `text` is empty.
pub(crate) fn text_element(name: &str, text: &str) -> Element {
    let element = Element::new(name);
    if text.is_empty() { element } else { element.with_text(text) }
}
