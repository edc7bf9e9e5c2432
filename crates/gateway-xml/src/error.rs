//! XML parsing and destructuring errors.

/// Errors raised while parsing raw bytes into a [`crate::dom::Element`] tree,
/// or while destructuring that tree with the combinators in
/// [`crate::combinators`].
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("expected root element `{expected}`, found `{found}`")]
    UnexpectedRoot { expected: String, found: String },
    #[error("missing required child element `{0}`")]
    MissingElement(String),
    #[error("expected exactly one `{name}` child, found {count}")]
    MultipleElements { name: String, count: usize },
    #[error("element `{0}` has no text content")]
    MissingText(String),
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

pub type XmlResult<T> = Result<T, XmlError>;
