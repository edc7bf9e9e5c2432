#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! The cooperative background tick loop.
//!
//! One [`Scheduler`] drives every configured connection through
//! [`gateway_core::connect`], [`gateway_core::submit_payments`], and
//! [`gateway_core::ingest_statements`] on a fixed interval. A connection
//! that fails is not retried immediately: its next attempt is pushed out by
//! an exponential backoff, capped at ten minutes, tracked independently of
//! the connection's own durable state so a transient bank outage never
//! touches the persisted record.
//!
//! A per-connection [`tokio::sync::Mutex`] keeps one connection's steps
//! (handshake, upload, download) from overlapping if a tick is still
//! running when the next one fires, or if something else drives the same
//! connection concurrently; unrelated connections proceed independently.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ebics_protocol::transport::BankTransport;
use gateway_types::error::GatewayResult;
use gateway_types::repository::GatewayStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Upper bound on backoff between retries of a failing connection.
const MAX_BACKOFF: Duration = Duration::minutes(10);

/// How often the loop wakes up to check every connection.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub tick_interval: StdDuration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: StdDuration::from_secs(1),
        }
    }
}

/// Backoff bookkeeping for one connection, held by the scheduler rather
/// than persisted: a restart simply starts every connection unbacked-off.
#[derive(Debug, Clone, Copy)]
struct BackoffState {
    consecutive_failures: u32,
    next_retry_at: DateTime<Utc>,
}

/// Doubles the delay per consecutive failure, starting at one second and
/// never exceeding [`MAX_BACKOFF`].
fn backoff_delay(consecutive_failures: u32) -> Duration {
    let shift = consecutive_failures.min(10);
    Duration::seconds(1i64 << shift).min(MAX_BACKOFF)
}

/// Drives every connection in `store` through one connect/submit/ingest
/// sweep per tick, independent of the HTTP surface.
pub struct Scheduler {
    store: Arc<dyn GatewayStore>,
    transport: Arc<dyn BankTransport>,
    config: SchedulerConfig,
    backoff: DashMap<String, BackoffState>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn GatewayStore>, transport: Arc<dyn BankTransport>, config: SchedulerConfig) -> Self {
        Self {
            store,
            transport,
            config,
            backoff: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// Runs ticks on `config.tick_interval` until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = shutdown.cancelled() => {
                    info!("scheduler shutting down");
                    return;
                }
            }
        }
    }

    /// Runs one sweep over every connection id currently on file. A
    /// connection still inside its backoff window is skipped; everything
    /// else is attempted, independent of whether its siblings succeed.
    pub async fn tick(&self) {
        let ids = match self.store.connections().list_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "failed to list connections for tick");
                return;
            }
        };
        for connection_id in ids {
            self.tick_one(&connection_id).await;
        }
    }

    #[instrument(skip(self), fields(connection_id = %connection_id))]
    async fn tick_one(&self, connection_id: &str) {
        let now = self.store.clock().now();
        if let Some(state) = self.backoff.get(connection_id) {
            if now < state.next_retry_at {
                return;
            }
        }

        let lock = self.connection_lock(connection_id);
        let _guard = lock.lock().await;

        match self.run_connection(connection_id).await {
            Ok(()) => {
                self.backoff.remove(connection_id);
            }
            Err(err) => {
                warn!(error = %err, "tick failed, backing off");
                self.record_failure(connection_id, now);
            }
        }
    }

    async fn run_connection(&self, connection_id: &str) -> GatewayResult<()> {
        gateway_core::connect(self.store.as_ref(), self.transport.as_ref(), connection_id).await?;

        let connection = self.store.connections().get(connection_id).await?;
        if !connection.is_ready() {
            // Waiting on the human operator to confirm INI/HIA at the bank.
            return Ok(());
        }

        gateway_core::submit_payments(self.store.as_ref(), self.transport.as_ref(), connection_id).await?;
        gateway_core::ingest_statements(self.store.as_ref(), self.transport.as_ref(), connection_id, None).await?;
        Ok(())
    }

    fn connection_lock(&self, connection_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(connection_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn record_failure(&self, connection_id: &str, now: DateTime<Utc>) {
        let mut state = self.backoff.entry(connection_id.to_string()).or_insert(BackoffState {
            consecutive_failures: 0,
            next_retry_at: now,
        });
        state.consecutive_failures += 1;
        state.next_retry_at = now + backoff_delay(state.consecutive_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_protocol::transport::FakeBankTransport;
    use gateway_core::store::InMemoryStore;
    use gateway_types::model::connection::{BankConnection, ConnectionConfig, EbicsConnectionConfig};
    use gateway_types::repository::{ConnectionRepository, GatewayStore};

    fn sample_connection() -> BankConnection {
        BankConnection::new(
            "conn-1",
            ConnectionConfig::Ebics(EbicsConnectionConfig {
                base_url: "https://bank.example/ebics".to_string(),
                host_id: "HOST1".to_string(),
                partner_id: "PARTNER1".to_string(),
                user_id: "USER1".to_string(),
                system_id: None,
            }),
        )
    }

    fn ok_response() -> Vec<u8> {
        br#"<ebicsUnsecuredResponse xmlns="http://www.ebics.org/H004">
          <header><mutable><ReturnCode>000000</ReturnCode><ReportText>[EBICS_OK]</ReportText></mutable></header>
        </ebicsUnsecuredResponse>"#
            .to_vec()
    }

    #[tokio::test]
    async fn tick_advances_a_fresh_connection_through_ini_and_hia() {
        let store = Arc::new(InMemoryStore::default());
        store.connections().upsert(sample_connection()).await.unwrap();
        let transport = Arc::new(FakeBankTransport::new(vec![ok_response(), ok_response()]));

        let scheduler = Scheduler::new(store.clone(), transport, SchedulerConfig::default());
        scheduler.tick().await;

        let connection = store.connections().get("conn-1").await.unwrap();
        assert_eq!(connection.ini_state, gateway_types::model::connection::KeyExchangeState::Sent);
        assert_eq!(connection.hia_state, gateway_types::model::connection::KeyExchangeState::Sent);
        assert!(!scheduler.backoff.contains_key("conn-1"));
    }

    #[tokio::test]
    async fn failed_tick_schedules_a_backed_off_retry() {
        let store = Arc::new(InMemoryStore::default());
        store.connections().upsert(sample_connection()).await.unwrap();
        // No scripted responses: the transport errors on the first call.
        let transport = Arc::new(FakeBankTransport::new(vec![]));

        let scheduler = Scheduler::new(store.clone(), transport, SchedulerConfig::default());
        scheduler.tick().await;

        let state = scheduler.backoff.get("conn-1").expect("failure recorded");
        assert_eq!(state.consecutive_failures, 1);
        assert!(state.next_retry_at > store.clock().now());
    }

    #[tokio::test]
    async fn tick_skips_a_connection_still_inside_its_backoff_window() {
        let store = Arc::new(InMemoryStore::default());
        store.connections().upsert(sample_connection()).await.unwrap();
        let transport = Arc::new(FakeBankTransport::new(vec![]));

        let scheduler = Scheduler::new(store.clone(), transport, SchedulerConfig::default());
        scheduler.tick().await;
        let first_retry_at = scheduler.backoff.get("conn-1").unwrap().next_retry_at;

        // Immediately ticking again must not touch the connection at all:
        // the backoff window skips it before the exhausted transport is reached.
        scheduler.tick().await;
        assert_eq!(scheduler.backoff.get("conn-1").unwrap().next_retry_at, first_retry_at);
    }
}
