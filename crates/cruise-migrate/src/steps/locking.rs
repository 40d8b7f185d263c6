use crate::{Error, MigrationContext, Result};
use cruise_xml::Element;

/// Replace the boolean `isLocked` with `lockBehavior`.
pub(crate) fn lock_behavior(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    for group in root.children_named_mut("pipelines") {
        for pipeline in group.children_named_mut("pipeline") {
            let Some(locked) = pipeline.attr("isLocked") else {
                continue;
            };
            if pipeline.has_attr("lockBehavior") {
                return Err(Error::precondition(
                    80,
                    format!(
                        "Pipeline '{}' declares both isLocked and lockBehavior",
                        pipeline.attr("name").unwrap_or_default()
                    ),
                ));
            }
            let behavior = match locked.trim() {
                "true" | "1" => "lockOnFailure",
                "false" | "0" => "none",
                other => {
                    return Err(Error::precondition(
                        80,
                        format!("'{}' is not a valid value for 'boolean'.", other),
                    ));
                }
            };
            pipeline.remove_attr("isLocked");
            pipeline.set_attr("lockBehavior", behavior);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::context;
    use rstest::rstest;

    #[rstest]
    #[case("true", "lockOnFailure")]
    #[case("false", "none")]
    fn test_is_locked_mapping(#[case] locked: &str, #[case] behavior: &str) {
        let xml = format!(r#"<cruise><pipelines><pipeline name="p" isLocked="{locked}" /></pipelines></cruise>"#);
        let mut root = cruise_xml::parse(&xml).unwrap();
        lock_behavior(&mut root, &context()).unwrap();
        let pipeline = root.child("pipelines").unwrap().child("pipeline").unwrap();
        assert_eq!(pipeline.attr("lockBehavior"), Some(behavior));
        assert!(!pipeline.has_attr("isLocked"));
    }

    #[test]
    fn test_both_lock_attributes_fail() {
        let mut root = cruise_xml::parse(
            r#"<cruise><pipelines><pipeline name="p" isLocked="true" lockBehavior="none" /></pipelines></cruise>"#,
        )
        .unwrap();
        let err = lock_behavior(&mut root, &context()).unwrap_err();
        assert!(matches!(err, Error::Precondition { version: 80, .. }));
    }
}
