//! Core data model for the bank connectivity gateway.
//!
//! Entities: [`BankConnection`], [`BankAccount`], [`PreparedPayment`],
//! [`RawBankMessage`], [`NormalizedTransaction`], and [`BackupFile`].
//! Ownership is one-way: a connection owns its key material, an account
//! owns its transactions and raw messages, a payment owns its lifecycle
//! flags. Cross-entity references are ids, resolved through a
//! [`crate::repository`] lookup rather than a stored back-pointer.

pub mod account;
pub mod backup;
pub mod connection;
pub mod message;
pub mod payment;
pub mod transaction;

pub use account::BankAccount;
pub use backup::BackupFile;
pub use connection::{
    BankConnection, ConnectionConfig, ConnectionStatus, EbicsConnectionConfig, KeyExchangeState,
    PrivateKeyDer, PublicKeyDer, SubscriberKeys,
};
pub use message::RawBankMessage;
pub use payment::PreparedPayment;
pub use transaction::{BankTransactionCode, Direction, EntryStatus, NormalizedTransaction};
