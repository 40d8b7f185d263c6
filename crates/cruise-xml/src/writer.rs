//! Tree to canonical markup

use crate::{Element, Node};
use quick_xml::escape::escape;

const INDENT: &str = "  ";

/// Serialize `root` as a complete document with declaration.
///
/// Output is canonical: two-space indentation, attributes in stored order,
/// elements without children self-closed, text-only elements on one line.
/// Writing the result of reading canonical output yields identical bytes.
pub fn write_document(root: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    write_element(root, 0, &mut out);
    out
}

/// Serialize one element without a declaration.
pub fn write_fragment(element: &Element) -> String {
    let mut out = String::new();
    write_element(element, 0, &mut out);
    out
}

fn write_element(element: &Element, depth: usize, out: &mut String) {
    indent(depth, out);
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in element.attributes() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str(" />\n");
        return;
    }
    out.push('>');

    if element.has_element_children() {
        out.push('\n');
        for child in &element.children {
            match child {
                Node::Element(e) => write_element(e, depth + 1, out),
                Node::Text(t) => {
                    indent(depth + 1, out);
                    out.push_str(&escape(t.trim()));
                    out.push('\n');
                }
                Node::CData(t) => {
                    indent(depth + 1, out);
                    write_cdata(t, out);
                    out.push('\n');
                }
            }
        }
        indent(depth, out);
    } else {
        for child in &element.children {
            match child {
                Node::Text(t) => out.push_str(&escape(t)),
                Node::CData(t) => write_cdata(t, out),
                Node::Element(_) => {}
            }
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}

fn write_cdata(text: &str, out: &mut String) {
    // "]]>" cannot appear inside one section, so split it across two.
    out.push_str("<![CDATA[");
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_layout() {
        let mut view = Element::new("view");
        view.push_cdata("//depot/...");
        let root = Element::new("cruise")
            .with_attr("schemaVersion", "139")
            .with_child(Element::new("p4").with_attr("port", "host:1666").with_child(view))
            .with_child(Element::new("value").with_text("a < b"));

        assert_eq!(
            write_document(&root),
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
                "<cruise schemaVersion=\"139\">\n",
                "  <p4 port=\"host:1666\">\n",
                "    <view><![CDATA[//depot/...]]></view>\n",
                "  </p4>\n",
                "  <value>a &lt; b</value>\n",
                "</cruise>\n",
            )
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let e = Element::new("exec").with_attr("args", "\"quoted\" & <tag>");
        assert_eq!(
            write_fragment(&e),
            "<exec args=\"&quot;quoted&quot; &amp; &lt;tag&gt;\" />\n"
        );
    }
}
