//! Markup to tree

use crate::{Element, Error, Node, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parse a document from raw bytes. A leading byte-order mark is ignored.
pub fn parse_bytes(input: &[u8]) -> Result<Element> {
    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
    let text = std::str::from_utf8(input).map_err(|_| Error::Encoding)?;
    parse(text)
}

/// Parse a document into its root element.
///
/// Whitespace-only text between elements is dropped, but kept when it is the
/// whole content of an element. Comments, processing instructions and the
/// declaration are not kept.
pub fn parse(input: &str) -> Result<Element> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::syntax(input, reader.error_position(), e))?;
        match event {
            Event::Start(start) => {
                let element = element_from(&start, input, reader.buffer_position())?;
                if stack.is_empty() && root.is_some() {
                    return Err(Error::MultipleRoots { element: element.name });
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from(&start, input, reader.buffer_position())?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let Some(mut element) = stack.pop() else {
                    return Err(Error::syntax(input, reader.buffer_position(), "unexpected closing tag"));
                };
                if element.has_element_children() {
                    element
                        .children
                        .retain(|c| !matches!(c, Node::Text(t) if t.trim().is_empty()));
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| Error::syntax(input, reader.buffer_position(), e))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(value.into_owned())),
                    None if value.trim().is_empty() => {}
                    None => {
                        return Err(Error::syntax(input, reader.buffer_position(), "text outside the root element"));
                    }
                }
            }
            Event::CData(data) => {
                let value = String::from_utf8(data.into_inner().into_owned()).map_err(|_| Error::Encoding)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::CData(value)),
                    None => {
                        return Err(Error::syntax(input, reader.buffer_position(), "CDATA outside the root element"));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::syntax(
            input,
            reader.buffer_position(),
            format!("element <{}> is never closed", open.name),
        ));
    }
    root.ok_or(Error::MissingRoot)
}

fn element_from(start: &BytesStart<'_>, input: &str, position: u64) -> Result<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|_| Error::Encoding)?
        .to_string();
    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| Error::syntax(input, position, e))?;
        let key = std::str::from_utf8(attribute.key.as_ref()).map_err(|_| Error::Encoding)?;
        let value = attribute
            .unescape_value()
            .map_err(|e| Error::syntax(input, position, e))?;
        if element.has_attr(key) {
            return Err(Error::syntax(input, position, format!("duplicate attribute '{}'", key)));
        }
        element.set_attr(key, value.into_owned());
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_some() => return Err(Error::MultipleRoots { element: element.name }),
        None => *root = Some(element),
    }
    Ok(())
}
