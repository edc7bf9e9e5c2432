#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Payment-initiation lifecycle, statement ingestion, and connection
//! registry for the bank connectivity gateway.
//!
//! This crate sits above [`ebics_protocol`] and [`iso20022`]: it knows
//! *when* to submit a payment, download a statement, or advance a
//! connection's key exchange, while those crates know *how* to speak
//! EBICS and read/write ISO 20022 documents. Persistence is abstracted
//! behind the [`gateway_types::repository`] traits, with [`store::InMemoryStore`]
//! provided for tests and the demo binary.
//!
//! # Modules
//!
//! - [`connect`] - INI/HIA/HPB key-exchange orchestration
//! - [`lifecycle`] - payment submission sweep and statement ingestion sweep
//! - [`backup`] - subscriber key backup export/import
//! - [`store`] - an in-memory [`gateway_types::repository::GatewayStore`]
//! - [`error`] - error conversions from the lower layers into [`gateway_types::error::GatewayError`]
//! - [`util`] - graceful shutdown signal handling

pub mod backup;
pub mod connect;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod util;

pub use backup::{export_backup, import_backup};
pub use connect::{connect, probe_version};
pub use lifecycle::{ingest_statements, submit_payments};
pub use store::InMemoryStore;
