//! Utilities shared across `gateway-core`:
//!
//! - [`sig_down`] - Graceful shutdown signal handling

pub mod sig_down;

pub use sig_down::*;
