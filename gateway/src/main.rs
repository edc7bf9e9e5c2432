//! Bank connectivity gateway entrypoint.
//!
//! This binary loads configuration, seeds configured bank connections into
//! an in-memory store, and runs the scheduler's cooperative tick loop
//! (connect, submit, ingest) until SIGTERM/SIGINT.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `PORT`, `HOST` are accepted but unused until the JSON HTTP surface
//!   this binary does not yet serve is built
//! - `TICK_INTERVAL_SECS`, `TRANSPORT_TIMEOUT_SECS` tune the scheduler

mod config;
mod run;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
