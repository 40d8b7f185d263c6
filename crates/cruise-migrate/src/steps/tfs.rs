use crate::{MigrationContext, Result};
use cruise_xml::Element;

/// `username="DOMAIN\user"` without a `domain` becomes `domain="DOMAIN" username="user"`.
pub(crate) fn split_domain(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    root.for_each_named("tfs", &mut |tfs| {
        if tfs.has_attr("domain") {
            return;
        }
        let Some((domain, user)) = tfs.attr("username").and_then(|u| u.split_once('\\')) else {
            return;
        };
        let (domain, user) = (domain.to_string(), user.to_string());
        tfs.set_attr("domain", domain);
        tfs.set_attr("username", user);
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::context;

    #[test]
    fn test_domain_split() {
        let mut root = cruise_xml::parse(
            r#"<cruise><tfs url="u" username="CORP\ann" projectPath="$/p" /><tfs url="u" username="CORP\bob" domain="OTHER" projectPath="$/p" /></cruise>"#,
        )
        .unwrap();
        split_domain(&mut root, &context()).unwrap();
        let tfs: Vec<_> = root.children_named("tfs").collect();
        assert_eq!(tfs[0].attr("domain"), Some("CORP"));
        assert_eq!(tfs[0].attr("username"), Some("ann"));
        assert_eq!(tfs[1].attr("username"), Some("CORP\\bob"));
    }
}
