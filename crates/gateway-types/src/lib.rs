#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the bank connectivity gateway.
//!
//! This crate provides the foundational data model, error taxonomy, and
//! repository traits shared by every other crate in the workspace. It is
//! deliberately transport- and persistence-agnostic: `ebics-protocol`
//! speaks the wire format, `gateway-core` drives the lifecycle, and
//! whatever backs [`repository::GatewayStore`] owns the actual storage.
//!
//! # Modules
//!
//! - [`clock`] - Injectable clock, so time-dependent logic is testable
//! - [`error`] - The canonical [`error::GatewayError`] taxonomy
//! - [`model`] - Bank connection, account, payment, message, transaction, and backup-file records
//! - [`repository`] - Async traits standing in for the persistence substrate

pub mod clock;
pub mod error;
pub mod model;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorKind, GatewayError, GatewayResult};
