//! An in-memory [`GatewayStore`] implementation.
//!
//! Durable persistence is explicitly out of scope: this store exists so
//! `gateway-core`'s lifecycle and reconciliation logic can be
//! exercised and tested without a real database, and so the `gateway`
//! binary has something concrete to wire up. A production deployment
//! swaps this for a type backed by a transactional store, against the
//! same [`ConnectionRepository`]/[`AccountRepository`]/[`PaymentRepository`]/[`LedgerRepository`] traits.

use async_trait::async_trait;
use dashmap::DashMap;
use gateway_types::clock::{Clock, SystemClock};
use gateway_types::error::{GatewayError, GatewayResult};
use gateway_types::model::{BankAccount, BankConnection, NormalizedTransaction, PreparedPayment, RawBankMessage};
use gateway_types::repository::{AccountRepository, ConnectionRepository, GatewayStore, LedgerRepository, PaymentRepository};

fn not_found(kind: &str, id: &str) -> GatewayError {
    GatewayError::not_found(format!("{kind} `{id}` not found"))
}

#[derive(Default)]
pub struct InMemoryConnections {
    connections: DashMap<String, BankConnection>,
}

#[async_trait]
impl ConnectionRepository for InMemoryConnections {
    async fn get(&self, connection_id: &str) -> GatewayResult<BankConnection> {
        self.connections
            .get(connection_id)
            .map(|c| c.clone())
            .ok_or_else(|| not_found("connection", connection_id))
    }

    async fn upsert(&self, connection: BankConnection) -> GatewayResult<()> {
        self.connections.insert(connection.connection_id.clone(), connection);
        Ok(())
    }

    async fn list_ids(&self) -> GatewayResult<Vec<String>> {
        Ok(self.connections.iter().map(|e| e.key().clone()).collect())
    }
}

#[derive(Default)]
pub struct InMemoryAccounts {
    accounts: DashMap<String, BankAccount>,
}

#[async_trait]
impl AccountRepository for InMemoryAccounts {
    async fn get(&self, account_id: &str) -> GatewayResult<BankAccount> {
        self.accounts
            .get(account_id)
            .map(|a| a.clone())
            .ok_or_else(|| not_found("account", account_id))
    }

    async fn upsert(&self, account: BankAccount) -> GatewayResult<()> {
        self.accounts.insert(account.account_id.clone(), account);
        Ok(())
    }

    async fn list_for_connection(&self, connection_id: &str) -> GatewayResult<Vec<BankAccount>> {
        Ok(self
            .accounts
            .iter()
            .filter(|e| e.connection_id == connection_id)
            .map(|e| e.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryPayments {
    payments: DashMap<String, PreparedPayment>,
}

#[async_trait]
impl PaymentRepository for InMemoryPayments {
    async fn get(&self, payment_id: &str) -> GatewayResult<PreparedPayment> {
        self.payments
            .get(payment_id)
            .map(|p| p.clone())
            .ok_or_else(|| not_found("payment", payment_id))
    }

    async fn upsert(&self, payment: PreparedPayment) -> GatewayResult<()> {
        self.payments.insert(payment.payment_id.clone(), payment);
        Ok(())
    }

    async fn submittable_for_connection(&self, connection_id: &str) -> GatewayResult<Vec<PreparedPayment>> {
        let mut matches: Vec<PreparedPayment> = self
            .payments
            .iter()
            .filter(|e| e.connection_id == connection_id && e.is_submittable())
            .map(|e| e.clone())
            .collect();
        matches.sort_by_key(|p| p.preparation_timestamp);
        Ok(matches)
    }

    async fn find_by_end_to_end_id(
        &self,
        connection_id: &str,
        end_to_end_id: &str,
    ) -> GatewayResult<Option<PreparedPayment>> {
        Ok(self
            .payments
            .iter()
            .find(|e| e.connection_id == connection_id && e.end_to_end_id == end_to_end_id)
            .map(|e| e.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryLedger {
    raw_messages: DashMap<(String, String), RawBankMessage>,
    transactions: DashMap<(String, String), NormalizedTransaction>,
}

#[async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn insert_raw_message_if_absent(&self, message: RawBankMessage) -> GatewayResult<bool> {
        let key = (message.connection_id.clone(), message.bank_message_id.clone());
        if self.raw_messages.contains_key(&key) {
            return Ok(false);
        }
        self.raw_messages.insert(key, message);
        Ok(true)
    }

    async fn upsert_transaction(&self, transaction: NormalizedTransaction) -> GatewayResult<()> {
        let key = (transaction.account_iban.clone(), transaction.bank_entry_reference.clone());
        self.transactions.insert(key, transaction);
        Ok(())
    }

    async fn transactions_for_account(&self, account_iban: &str) -> GatewayResult<Vec<NormalizedTransaction>> {
        let mut matches: Vec<NormalizedTransaction> = self
            .transactions
            .iter()
            .filter(|e| e.account_iban == account_iban)
            .map(|e| e.clone())
            .collect();
        matches.sort_by_key(|t| t.booking_date_unix_ms);
        Ok(matches)
    }
}

/// A fully in-memory [`GatewayStore`], backed by [`SystemClock`] unless
/// constructed with [`InMemoryStore::with_clock`] for tests.
pub struct InMemoryStore {
    connections: InMemoryConnections,
    accounts: InMemoryAccounts,
    payments: InMemoryPayments,
    ledger: InMemoryLedger,
    clock: Box<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }
}

impl InMemoryStore {
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            connections: InMemoryConnections::default(),
            accounts: InMemoryAccounts::default(),
            payments: InMemoryPayments::default(),
            ledger: InMemoryLedger::default(),
            clock,
        }
    }
}

impl GatewayStore for InMemoryStore {
    fn connections(&self) -> &dyn ConnectionRepository {
        &self.connections
    }

    fn accounts(&self) -> &dyn AccountRepository {
        &self.accounts
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }

    fn ledger(&self) -> &dyn LedgerRepository {
        &self.ledger
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::model::connection::{ConnectionConfig, EbicsConnectionConfig};
    use rust_decimal::Decimal;

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

    #[tokio::test]
    async fn raw_message_dedup_is_idempotent() {
        let store = InMemoryStore::default();
        let message = RawBankMessage::new("conn-1", "MSG-1", "acc-1", "<xml/>");
        assert!(store.ledger().insert_raw_message_if_absent(message.clone()).await.unwrap());
        assert!(!store.ledger().insert_raw_message_if_absent(message).await.unwrap());
    }

    #[tokio::test]
    async fn submittable_payments_exclude_submitted_and_invalid() {
        let store = InMemoryStore::default();
        store.connections().upsert(sample_connection()).await.unwrap();

        let mut submitted = PreparedPayment::new(
            "pay-1", "conn-1", "acc-1", "DE1", "BIC1", "A", Decimal::ONE, "EUR", "s", chrono::Utc::now(),
            "e2e-1", "pmtinf-1", "msg-1",
        );
        submitted.mark_submitted(chrono::Utc::now());
        store.payments().upsert(submitted).await.unwrap();

        let pending = PreparedPayment::new(
            "pay-2", "conn-1", "acc-1", "DE2", "BIC2", "B", Decimal::TWO, "EUR", "s", chrono::Utc::now(),
            "e2e-2", "pmtinf-2", "msg-2",
        );
        store.payments().upsert(pending).await.unwrap();

        let submittable = store.payments().submittable_for_connection("conn-1").await.unwrap();
        assert_eq!(submittable.len(), 1);
        assert_eq!(submittable[0].payment_id, "pay-2");
    }
}
