//! Destructuring combinators for walking a parsed [`crate::dom::Element`]
//! tree the way ISO 20022 and EBICS schemas are actually structured:
//! predictable nesting, but with optional and repeating elements mixed
//! freely at every level. Hand-rolled recursive-descent over raw trees
//! gets unreadable fast; these combinators keep each traversal step a
//! single expression.

use crate::dom::Element;
use crate::error::{XmlError, XmlResult};

/// Verifies `element` is the expected root, returning it unchanged.
pub fn require_root<'a>(element: &'a Element, expected: &str) -> XmlResult<&'a Element> {
    if element.name != expected {
        return Err(XmlError::UnexpectedRoot {
            expected: expected.to_string(),
            found: element.name.clone(),
        });
    }
    Ok(element)
}

/// Returns the single child named `name`, erroring if it is missing or
/// repeated.
pub fn require_unique_child<'a>(element: &'a Element, name: &str) -> XmlResult<&'a Element> {
    let mut matches = element.children_named(name);
    let first = matches.next().ok_or_else(|| XmlError::MissingElement(name.to_string()))?;
    let count = 1 + matches.count();
    if count > 1 {
        return Err(XmlError::MultipleElements {
            name: name.to_string(),
            count,
        });
    }
    Ok(first)
}

/// Returns the single child named `name`, or `None` if it is absent;
/// erroring if it is repeated.
pub fn maybe_unique_child<'a>(element: &'a Element, name: &str) -> XmlResult<Option<&'a Element>> {
    let matches: Vec<&Element> = element.children_named(name).collect();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches[0])),
        count => Err(XmlError::MultipleElements {
            name: name.to_string(),
            count,
        }),
    }
}

/// Maps every direct child named `name` through `f`, collecting results
/// (or the first error).
pub fn map_each_child<'a, T>(
    element: &'a Element,
    name: &str,
    mut f: impl FnMut(&'a Element) -> XmlResult<T>,
) -> XmlResult<Vec<T>> {
    element.children_named(name).map(|child| f(child)).collect()
}

/// Returns the trimmed text content of the unique `name` child.
pub fn require_text_child<'a>(element: &'a Element, name: &str) -> XmlResult<&'a str> {
    let child = require_unique_child(element, name)?;
    let text = child.text_trimmed();
    if text.is_empty() {
        return Err(XmlError::MissingText(name.to_string()));
    }
    Ok(text)
}

/// Returns the trimmed text content of the `name` child, or `None` if absent.
pub fn maybe_text_child<'a>(element: &'a Element, name: &str) -> XmlResult<Option<&'a str>> {
    Ok(maybe_unique_child(element, name)?.map(|c| c.text_trimmed()))
}
