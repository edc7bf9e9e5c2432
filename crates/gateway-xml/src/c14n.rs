//! A simplified exclusive XML canonicalization (c14n) suitable for signing
//! and verifying `ds:SignedInfo` and `authenticate="true"` elements inside
//! a gateway we control both ends of.
//!
//! True exclusive XML-C14N (the W3C algorithm EBICS cites) is
//! namespace-prefix-aware and operates on the original byte stream so it
//! can preserve insignificant whitespace decisions made by whichever
//! parser produced the document. Since [`crate::dom::Element`] already
//! discards namespace prefixes and original whitespace, this module
//! instead canonicalizes from the parsed tree: attributes sorted by local
//! name, no self-closing tags, and entity-escaped text. That is sufficient
//! for round-tripping signatures between this gateway's own signer and
//! verifier — it is not a drop-in replacement for the W3C algorithm
//! against documents produced by unrelated XML stacks, and is called out
//! as a simplification rather than a faithful implementation.

use crate::dom::Element;

/// Serializes `element` and its subtree into a canonical byte form.
pub fn canonicalize(element: &Element) -> Vec<u8> {
    let mut out = String::new();
    write_element(element, &mut out);
    out.into_bytes()
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    let mut attrs = element.attrs.clone();
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in &attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
    escape_text(&element.text, out);
    for child in &element.children {
        write_element(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}
