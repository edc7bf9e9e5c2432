#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EBICS 2.5 (H004) client protocol engine.
//!
//! This crate drives one bank connection's side of an EBICS conversation:
//! the unauthenticated `HEV` version probe, the `INI`/`HIA`/`HPB` key
//! exchange, and the authenticated `C52`/`C53`/`HTD` download and `CCT`
//! upload order types. It has no concept of scheduling, persistence, or
//! which connections exist — `gateway-core` owns all of that and calls
//! into this crate per order.
//!
//! # Modules
//!
//! - [`transport`] - The [`transport::BankTransport`] abstraction over HTTP
//! - [`hev`] - Version probing
//! - [`keyex`] - INI/HIA/HPB key exchange
//! - [`download`] - C52/C53/HTD download orders
//! - [`upload`] - CCT upload orders
//! - [`codes`] - EBICS return code classification
//! - [`envelope`] - Shared compression/base64/return-code plumbing
//! - [`signing`] - Builds the `AuthSignature` over a canonicalized header
//! - [`error`] - The [`error::ProtocolError`] taxonomy

pub mod codes;
pub mod download;
pub mod envelope;
pub mod error;
pub mod hev;
pub mod keyex;
pub mod signing;
pub mod transport;
pub mod upload;

pub use error::{ProtocolError, ProtocolResult};
pub use transport::BankTransport;
