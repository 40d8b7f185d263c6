//! Property tests for case-insensitive names

use cruise_model::CaseInsensitiveString;
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #[test]
    fn test_case_changes_preserve_equality(name in "[a-zA-Z0-9_.-]{1,32}") {
        let original = CaseInsensitiveString::new(name.clone());
        prop_assert_eq!(&original, &CaseInsensitiveString::new(name.to_uppercase()));
        prop_assert_eq!(&original, &CaseInsensitiveString::new(name.to_lowercase()));
        prop_assert_eq!(original.as_str(), name.as_str());
    }

    #[test]
    fn test_equal_names_hash_alike(name in "[a-zA-Z]{1,16}") {
        let mut set = HashSet::new();
        set.insert(CaseInsensitiveString::new(name.to_uppercase()));
        prop_assert!(!set.insert(CaseInsensitiveString::new(name.to_lowercase())));
    }

    #[test]
    fn test_ordering_agrees_with_equality(a in "[a-zA-Z]{1,8}", b in "[a-zA-Z]{1,8}") {
        let left = CaseInsensitiveString::new(a);
        let right = CaseInsensitiveString::new(b);
        prop_assert_eq!(left == right, left.cmp(&right) == std::cmp::Ordering::Equal);
    }
}

#[test]
fn test_accents_are_significant() {
    assert_ne!(CaseInsensitiveString::new("resume"), CaseInsensitiveString::new("résumé"));
    assert_eq!(CaseInsensitiveString::new("RÉSUMÉ"), CaseInsensitiveString::new("résumé"));
}
