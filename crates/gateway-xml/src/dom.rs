//! A minimal, namespace-insensitive XML DOM.
//!
//! EBICS and ISO 20022 documents are produced by a handful of banking
//! software stacks that are inconsistent about namespace prefixes
//! (`ns2:Document`, `Document`, default-namespaced, etc). Rather than
//! fight that, every element and attribute name here is stored as its
//! *local* name — the part after the last `:` — and namespace URIs are
//! dropped once parsing is done. Signature canonicalization (`c14n`) is
//! the one place namespaces still matter, and it works from the raw
//! byte stream rather than this tree.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{XmlError, XmlResult};

/// An XML element with its local name, attributes, and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// Returns the value of an attribute by local name, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns all direct children whose local name matches `name`.
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text content directly inside this element (not descendants').
    pub fn text_trimmed(&self) -> &str {
        self.text.trim()
    }
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    match s.find(':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.into_owned(),
    }
}

/// Parses a complete XML document into an [`Element`] tree rooted at the
/// document element. Processing instructions, comments, and DOCTYPEs are
/// ignored.
pub fn parse(bytes: &[u8]) -> XmlResult<Element> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::Malformed(e.to_string()))?
        {
            Event::Start(tag) => {
                let name = local_name(tag.name().as_ref());
                let mut attrs = Vec::new();
                for attr in tag.attributes() {
                    let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
                    let key = local_name(attr.key.as_ref());
                    if key == "xmlns" || key.starts_with("xmlns:") {
                        continue;
                    }
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(|e| XmlError::Malformed(e.to_string()))?
                        .into_owned();
                    attrs.push((key, value));
                }
                stack.push(Element {
                    name,
                    attrs,
                    children: Vec::new(),
                    text: String::new(),
                });
            }
            Event::Empty(tag) => {
                let name = local_name(tag.name().as_ref());
                let mut attrs = Vec::new();
                for attr in tag.attributes() {
                    let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
                    let key = local_name(attr.key.as_ref());
                    if key == "xmlns" || key.starts_with("xmlns:") {
                        continue;
                    }
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(|e| XmlError::Malformed(e.to_string()))?
                        .into_owned();
                    attrs.push((key, value));
                }
                let element = Element {
                    name,
                    attrs,
                    children: Vec::new(),
                    text: String::new(),
                };
                push_finished(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let decoded = text
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decoded);
                }
            }
            Event::CData(text) => {
                let decoded = String::from_utf8_lossy(text.as_ref()).into_owned();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decoded);
                }
            }
            Event::End(_) => {
                let finished = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unbalanced end tag".into()))?;
                push_finished(&mut stack, &mut root, finished)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| XmlError::Malformed("document has no root element".into()))
}

fn push_finished(
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
    element: Element,
) -> XmlResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_some() {
                return Err(XmlError::Malformed(
                    "multiple root-level elements".to_string(),
                ));
            }
            *root = Some(element);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_strips_namespace_prefixes() {
        let xml = br#"<?xml version="1.0"?>
            <ns2:Document xmlns:ns2="urn:test">
                <ns2:Header id="1">hello</ns2:Header>
                <ns2:Body/>
            </ns2:Document>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.name, "Document");
        let header = root.children_named("Header").next().unwrap();
        assert_eq!(header.attr("id"), Some("1"));
        assert_eq!(header.text_trimmed(), "hello");
        assert_eq!(root.children_named("Body").count(), 1);
    }
}
