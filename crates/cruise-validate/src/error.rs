//! Validation errors

use serde::Serialize;

/// One semantic violation.
///
/// `path` locates the offending entity (`pipeline[build]/stage[test]/job[unit]`),
/// `message` is stable and asserted on verbatim by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Accumulates violations across the check battery.
#[derive(Debug, Default)]
pub(crate) struct Report {
    errors: Vec<ValidationError>,
}

impl Report {
    pub(crate) fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(path, message));
    }

    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Entity path builder: `pipeline[build]/stage[test]`.
pub(crate) fn path(segments: &[(&str, &str)]) -> String {
    segments
        .iter()
        .map(|(kind, name)| format!("{kind}[{name}]"))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_path() {
        let err = ValidationError::new(path(&[("pipeline", "build"), ("stage", "test")]), "broken");
        assert_eq!(err.to_string(), "pipeline[build]/stage[test]: broken");
    }

    #[test]
    fn test_serializes_as_object() {
        let json = serde_json::to_value(ValidationError::new("templates", "bad")).unwrap();
        assert_eq!(json, serde_json::json!({"path": "templates", "message": "bad"}));
    }
}
