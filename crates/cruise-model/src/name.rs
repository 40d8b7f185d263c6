//! Case-insensitive identifiers

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A name that compares case-insensitively but keeps its original spelling.
///
/// Comparison lowercases with Unicode rules, so accents stay significant:
/// `"Build"` equals `"BUILD"` but `"resume"` does not equal `"résumé"`.
#[derive(Clone)]
pub struct CaseInsensitiveString {
    name: String,
    lowered: String,
}

impl CaseInsensitiveString {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let lowered = name.to_lowercase();
        Self { name, lowered }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The lowercased comparison key.
    pub fn key(&self) -> &str {
        &self.lowered
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Case-insensitive comparison against a plain string.
    pub fn matches(&self, other: &str) -> bool {
        self.lowered == other.to_lowercase()
    }
}

impl PartialEq for CaseInsensitiveString {
    fn eq(&self, other: &Self) -> bool {
        self.lowered == other.lowered
    }
}

impl Eq for CaseInsensitiveString {}

impl PartialEq<str> for CaseInsensitiveString {
    fn eq(&self, other: &str) -> bool {
        self.matches(other)
    }
}

impl PartialEq<&str> for CaseInsensitiveString {
    fn eq(&self, other: &&str) -> bool {
        self.matches(other)
    }
}

impl Hash for CaseInsensitiveString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lowered.hash(state);
    }
}

impl PartialOrd for CaseInsensitiveString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CaseInsensitiveString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lowered.cmp(&other.lowered)
    }
}

impl fmt::Debug for CaseInsensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name)
    }
}

impl fmt::Display for CaseInsensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for CaseInsensitiveString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CaseInsensitiveString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for CaseInsensitiveString {
    fn from(s: &String) -> Self {
        Self::new(s.as_str())
    }
}

impl Serialize for CaseInsensitiveString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}
