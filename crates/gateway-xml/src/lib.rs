#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! A minimal namespace-insensitive XML DOM, destructuring combinators, and
//! exclusive XML-C14N canonicalization, purpose-built for EBICS and ISO
//! 20022 documents rather than general-purpose XML processing.
//!
//! # Modules
//!
//! - [`dom`] - Parses bytes into an [`dom::Element`] tree
//! - [`combinators`] - Navigates that tree without hand-rolled recursion
//! - [`c14n`] - Canonical serialization for signing and verification
//! - [`error`] - The [`error::XmlError`] taxonomy

pub mod c14n;
pub mod combinators;
pub mod dom;
pub mod error;

pub use dom::{Element, parse};
pub use error::{XmlError, XmlResult};
