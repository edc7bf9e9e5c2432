//! Repository traits standing in for the persistence substrate.
//!
//! Durable storage (a transactional key/row store) is out of scope here;
//! `gateway-core` is written against these narrow async traits instead of
//! a concrete database, the same way registries elsewhere in this codebase
//! are built from configured providers rather than assuming one backend.
//! Each method corresponds to one row-level operation; transactional
//! upsert semantics (repeatable read) are the implementation's
//! responsibility.

use crate::clock::Clock;
use crate::error::GatewayResult;
use crate::model::{BankAccount, BankConnection, NormalizedTransaction, PreparedPayment, RawBankMessage};
use async_trait::async_trait;

#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn get(&self, connection_id: &str) -> GatewayResult<BankConnection>;
    async fn upsert(&self, connection: BankConnection) -> GatewayResult<()>;
    async fn list_ids(&self) -> GatewayResult<Vec<String>>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get(&self, account_id: &str) -> GatewayResult<BankAccount>;
    async fn upsert(&self, account: BankAccount) -> GatewayResult<()>;
    async fn list_for_connection(&self, connection_id: &str) -> GatewayResult<Vec<BankAccount>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn get(&self, payment_id: &str) -> GatewayResult<PreparedPayment>;
    async fn upsert(&self, payment: PreparedPayment) -> GatewayResult<()>;
    /// Payments with `submitted=false AND invalid=false` for one connection,
    /// in preparation-timestamp order.
    async fn submittable_for_connection(
        &self,
        connection_id: &str,
    ) -> GatewayResult<Vec<PreparedPayment>>;
    /// Lookup by `end_to_end_id`, used by the reconciliation loop.
    async fn find_by_end_to_end_id(
        &self,
        connection_id: &str,
        end_to_end_id: &str,
    ) -> GatewayResult<Option<PreparedPayment>>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Stores a raw message if its `(connection_id, bank_message_id)` pair
    /// is new. Returns `false` if it was already present (duplicate).
    async fn insert_raw_message_if_absent(&self, message: RawBankMessage) -> GatewayResult<bool>;

    /// Upserts a normalized transaction keyed by
    /// `(account_iban, bank_entry_reference)`.
    async fn upsert_transaction(&self, transaction: NormalizedTransaction) -> GatewayResult<()>;

    async fn transactions_for_account(
        &self,
        account_iban: &str,
    ) -> GatewayResult<Vec<NormalizedTransaction>>;
}

/// Bundles the four repositories plus the clock `gateway-core` needs to run
/// one tick's worth of work against a connection.
pub trait GatewayStore: Send + Sync {
    fn connections(&self) -> &dyn ConnectionRepository;
    fn accounts(&self) -> &dyn AccountRepository;
    fn payments(&self) -> &dyn PaymentRepository;
    fn ledger(&self) -> &dyn LedgerRepository;
    fn clock(&self) -> &dyn Clock;
}
