use crate::{MigrationContext, Result};
use cruise_secure::{is_legacy_token, normalize};
use cruise_xml::Element;
use tracing::warn;

const ENCRYPTED_ATTR: &str = "encryptedPassword";
const ENCRYPTED_ELEMENT: &str = "encryptedValue";

/// Apply `rewrite` to every encrypted token in the tree.
fn for_each_token(root: &mut Element, rewrite: &mut impl FnMut(&str) -> Result<String>) -> Result<()> {
    root.try_walk_mut(&mut |element| {
        if let Some(token) = element.attr(ENCRYPTED_ATTR) {
            let rewritten = rewrite(token)?;
            element.set_attr(ENCRYPTED_ATTR, rewritten);
        }
        if element.is(ENCRYPTED_ELEMENT) {
            let rewritten = rewrite(&element.text())?;
            element.set_text(rewritten);
        }
        Ok(())
    })
}

pub(crate) fn strip_whitespace(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    for_each_token(root, &mut |token| Ok(normalize(token)))
}

/// Decrypt every DES token and encrypt the plaintext again with AES.
pub(crate) fn reencrypt_legacy(root: &mut Element, context: &MigrationContext<'_>) -> Result<()> {
    let mut count = 0usize;
    for_each_token(root, &mut |token| {
        if token.trim().is_empty() || !is_legacy_token(token) {
            return Ok(token.to_string());
        }
        count += 1;
        Ok(context.cipher.reencrypt(token)?)
    })?;
    if count > 0 {
        warn!(count, "re-encrypted legacy DES values");
    }
    Ok(())
}

/// Remove empty password attributes and properties without any value.
pub(crate) fn drop_empty(root: &mut Element, _: &MigrationContext<'_>) -> Result<()> {
    root.walk_mut(&mut |element| {
        for attr in ["password", ENCRYPTED_ATTR] {
            if element.attr(attr).is_some_and(|v| v.is_empty()) {
                element.remove_attr(attr);
            }
        }
        element.retain_elements(|child| !(child.is("property") && is_empty_secure_property(child)));
    });
    Ok(())
}

fn is_empty_secure_property(property: &Element) -> bool {
    let Some(encrypted) = property.child(ENCRYPTED_ELEMENT) else {
        return false;
    };
    let plain = property.child_text("value").unwrap_or_default();
    encrypted.text().trim().is_empty() && plain.is_empty()
}
