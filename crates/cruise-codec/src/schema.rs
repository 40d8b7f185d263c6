//! Structural rules: child sequences, attributes, value facets

use crate::{Error, Result};
use cruise_xml::Element;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub(crate) const NAME_PATTERN: &str = r"[a-zA-Z0-9_\-]{1}[a-zA-Z0-9_\-.]*";
pub(crate) const COMMAND_PATTERN: &str = r"\S(.*\S)?";

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{}$", NAME_PATTERN)).unwrap());
static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{}$", COMMAND_PATTERN)).unwrap());

/// One entry of a child sequence: any of `names`, between `min` and `max` times.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Particle {
    names: &'static [&'static str],
    min: usize,
    max: Option<usize>,
}

pub(crate) const fn optional(names: &'static [&'static str]) -> Particle {
    Particle { names, min: 0, max: Some(1) }
}

pub(crate) const fn required(names: &'static [&'static str]) -> Particle {
    Particle { names, min: 1, max: Some(1) }
}

pub(crate) const fn any_number(names: &'static [&'static str]) -> Particle {
    Particle { names, min: 0, max: None }
}

pub(crate) const fn at_least_one(names: &'static [&'static str]) -> Particle {
    Particle { names, min: 1, max: None }
}

fn expected(names: &[&str]) -> String {
    format!("'{{{}}}'", names.join(", "))
}

/// Check that element children follow `particles` in order.
pub(crate) fn check_sequence(element: &Element, particles: &[Particle]) -> Result<()> {
    let mut index = 0;
    let mut count = 0;
    for child in element.elements() {
        loop {
            let Some(particle) = particles.get(index) else {
                return Err(Error::structural(
                    &element.name,
                    format!(
                        "Invalid content was found starting with element '{}'. No child element is expected at this point.",
                        child.name
                    ),
                ));
            };
            let fits = particle.names.contains(&child.name.as_str()) && particle.max.is_none_or(|max| count < max);
            if fits {
                count += 1;
                break;
            }
            if count < particle.min {
                return Err(Error::structural(
                    &element.name,
                    format!(
                        "Invalid content was found starting with element '{}'. One of {} is expected.",
                        child.name,
                        expected(particle.names)
                    ),
                ));
            }
            index += 1;
            count = 0;
        }
    }
    for particle in &particles[index.min(particles.len())..] {
        if count < particle.min {
            return Err(Error::structural(
                &element.name,
                format!(
                    "The content of element '{}' is not complete. One of {} is expected.",
                    element.name,
                    expected(particle.names)
                ),
            ));
        }
        count = 0;
    }
    Ok(())
}

/// Reject attributes outside `allowed`.
pub(crate) fn check_attrs(element: &Element, allowed: &[&str]) -> Result<()> {
    for (key, _) in element.attributes() {
        if !allowed.contains(&key) {
            return Err(Error::structural(
                &element.name,
                format!("Attribute '{}' is not allowed to appear in element '{}'.", key, element.name),
            ));
        }
    }
    Ok(())
}

pub(crate) fn require_attr<'a>(element: &'a Element, key: &str) -> Result<&'a str> {
    element.attr(key).ok_or_else(|| {
        Error::structural(
            &element.name,
            format!("Attribute '{}' must appear on element '{}'.", key, element.name),
        )
    })
}

/// Required attribute of a plugin-scoped entity, e.g. `"Plugin id" is required for ArtifactStore`.
pub(crate) fn require_entity_attr<'a>(element: &'a Element, key: &str, label: &str, entity: &str) -> Result<&'a str> {
    match element.attr(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::structural(&element.name, format!("\"{}\" is required for {}", label, entity))),
    }
}

/// Check a value against the name pattern.
pub(crate) fn check_name<'a>(element: &Element, label: &str, value: &'a str) -> Result<&'a str> {
    if NAME_RE.is_match(value) {
        return Ok(value);
    }
    Err(Error::structural(
        &element.name,
        format!("{} is invalid. \"{}\" should conform to the pattern - {}", label, value, NAME_PATTERN),
    ))
}

/// Required attribute holding a name.
pub(crate) fn name_attr<'a>(element: &'a Element, key: &str, label: &str) -> Result<&'a str> {
    check_name(element, label, require_attr(element, key)?)
}

pub(crate) fn check_command<'a>(element: &Element, value: &'a str) -> Result<&'a str> {
    if COMMAND_RE.is_match(value) {
        return Ok(value);
    }
    Err(Error::structural(
        &element.name,
        format!("Command is invalid. \"{}\" should conform to the pattern - {}", value, COMMAND_PATTERN),
    ))
}

pub(crate) fn parse_bool(element: &Element, value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::structural(
            &element.name,
            format!("'{}' is not a valid value for 'boolean'.", other),
        )),
    }
}

/// Optional boolean attribute with a default.
pub(crate) fn bool_attr(element: &Element, key: &str, default: bool) -> Result<bool> {
    element.attr(key).map_or(Ok(default), |v| parse_bool(element, v))
}

pub(crate) fn parse_integer(element: &Element, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        Error::structural(&element.name, format!("'{}' is not a valid value for 'integer'.", value))
    })
}

pub(crate) fn parse_positive(element: &Element, value: &str) -> Result<u32> {
    let number: i64 = value.trim().parse().map_err(|_| {
        Error::structural(&element.name, format!("'{}' is not a valid value for 'integer'.", value))
    })?;
    match u32::try_from(number) {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Error::structural(
            &element.name,
            format!(
                "'{}' is not facet-valid with respect to minInclusive '1' for type 'positiveInteger'.",
                value
            ),
        )),
    }
}

/// Check `value` is one of `allowed`, returning it unchanged.
pub(crate) fn check_enum<'a>(element: &Element, value: &'a str, allowed: &[&str]) -> Result<&'a str> {
    if allowed.contains(&value) {
        return Ok(value);
    }
    Err(Error::structural(
        &element.name,
        format!(
            "Value '{}' is not facet-valid with respect to enumeration '[{}]'. It must be a value from the enumeration.",
            value,
            allowed.join(", ")
        ),
    ))
}

/// Exact-match uniqueness of values within one scope.
pub(crate) struct IdentityConstraint {
    scope: &'static str,
    seen: HashSet<String>,
}

impl IdentityConstraint {
    pub(crate) fn new(scope: &'static str) -> Self {
        Self {
            scope,
            seen: HashSet::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: &str) -> Result<()> {
        if self.seen.insert(value.to_string()) {
            return Ok(());
        }
        Err(Error::structural(
            self.scope,
            format!(
                "Duplicate unique value [{}] declared for identity constraint of element \"{}\".",
                value, self.scope
            ),
        ))
    }
}

/// Trimmed text content, `None` when blank.
pub(crate) fn text_of(element: &Element) -> Option<String> {
    let text = element.text();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PIPELINE: &[Particle] = &[
        optional(&["params"]),
        optional(&["timer"]),
        required(&["materials"]),
        any_number(&["stage"]),
    ];

    fn element(children: &[&str]) -> Element {
        let mut e = Element::new("pipeline");
        for c in children {
            e.push(Element::new(*c));
        }
        e
    }

    #[rstest]
    #[case(&["materials"])]
    #[case(&["params", "materials", "stage", "stage"])]
    #[case(&["timer", "materials", "stage"])]
    fn test_sequence_accepts(#[case] children: &[&str]) {
        assert!(check_sequence(&element(children), PIPELINE).is_ok());
    }

    #[rstest]
    #[case(&["materials", "timer"], "Invalid content was found starting with element 'timer'. No child element is expected at this point.")]
    #[case(&["stage"], "Invalid content was found starting with element 'stage'. One of '{materials}' is expected.")]
    #[case(&["params"], "The content of element 'pipeline' is not complete. One of '{materials}' is expected.")]
    #[case(&["materials", "mingle"], "Invalid content was found starting with element 'mingle'. No child element is expected at this point.")]
    fn test_sequence_rejects(#[case] children: &[&str], #[case] message: &str) {
        let err = check_sequence(&element(children), PIPELINE).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_name_pattern() {
        let e = Element::new("environment");
        assert!(check_name(&e, "Name", "uat-1.2").is_ok());
        let err = check_name(&e, "Name", "exclamation is invalid !").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Name is invalid. "exclamation is invalid !" should conform to the pattern - [a-zA-Z0-9_\-]{1}[a-zA-Z0-9_\-.]*"#
        );
    }

    #[rstest]
    #[case("ls", true)]
    #[case("bundle  ", false)]
    #[case("    bundle", false)]
    #[case("", false)]
    fn test_command_pattern(#[case] command: &str, #[case] ok: bool) {
        assert_eq!(check_command(&Element::new("exec"), command).is_ok(), ok);
    }

    #[test]
    fn test_positive_integer() {
        let e = Element::new("job");
        assert_eq!(parse_positive(&e, "3").unwrap(), 3);
        assert_eq!(
            parse_positive(&e, "-1").unwrap_err().to_string(),
            "'-1' is not facet-valid with respect to minInclusive '1' for type 'positiveInteger'."
        );
    }

    #[test]
    fn test_identity_constraint() {
        let mut ids = IdentityConstraint::new("environments");
        ids.insert("uat").unwrap();
        assert_eq!(
            ids.insert("uat").unwrap_err().to_string(),
            "Duplicate unique value [uat] declared for identity constraint of element \"environments\"."
        );
    }
}
