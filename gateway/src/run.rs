//! Startup wiring for the bank connectivity gateway.
//!
//! Loads configuration, seeds configured connections into an in-memory
//! store, and runs the scheduler until a shutdown signal arrives. The JSON
//! HTTP surface is out of scope, so `config.port()`/`config.host()` are
//! accepted but unused for now — they exist for whoever wires that surface
//! up, same as the bind address fields in the configuration this binary's
//! loader was modeled on.

use std::sync::Arc;

use dotenvy::dotenv;
use ebics_protocol::transport::{BankTransport, ReqwestTransport};
use gateway_core::store::InMemoryStore;
use gateway_core::util::SigDown;
use gateway_types::model::connection::BankConnection;
use gateway_types::repository::{ConnectionRepository, GatewayStore};
use scheduler::{Scheduler, SchedulerConfig};
use tracing_subscriber::EnvFilter;

use crate::config::GatewayConfig;

/// Initializes the gateway: loads config, seeds connections, runs the
/// scheduler loop.
///
/// - Loads `.env` variables.
/// - Initializes `tracing` logging.
/// - Seeds every configured bank connection into the store.
/// - Runs the scheduler's tick loop until SIGTERM/SIGINT.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::load()?;

    let store: Arc<dyn GatewayStore> = Arc::new(InMemoryStore::default());
    for configured in config.connections() {
        let connection = BankConnection::new(configured.connection_id.clone(), configured.config.clone());
        store.connections().upsert(connection).await?;
    }
    tracing::info!(count = config.connections().len(), "seeded bank connections");

    let transport: Arc<dyn BankTransport> = Arc::new(ReqwestTransport::new(config.transport_timeout()));
    let scheduler_config = SchedulerConfig {
        tick_interval: config.tick_interval(),
    };
    let scheduler = Scheduler::new(store, transport, scheduler_config);

    let sig_down = SigDown::try_new()?;
    let shutdown = sig_down.cancellation_token();

    tracing::info!(
        tick_interval = ?config.tick_interval(),
        transport_timeout = ?config.transport_timeout(),
        "starting scheduler"
    );
    scheduler.run(shutdown).await;

    Ok(())
}
