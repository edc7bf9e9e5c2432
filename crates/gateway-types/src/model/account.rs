//! Bank account records.

use serde::{Deserialize, Serialize};

/// A bank account bound to a [`crate::model::BankConnection`].
///
/// Ownership: a bank account exclusively owns its transactions and raw
/// messages; the connection is referenced by id, never by pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_id: String,
    pub connection_id: String,
    pub iban: String,
    pub bic: String,
    pub holder_name: String,
    /// Monotonically increasing watermark of the highest bank-assigned
    /// message id ingested for this account. Advanced atomically with
    /// ingest.
    pub highest_seen_bank_message_id: i64,
}

impl BankAccount {
    pub fn new(
        account_id: impl Into<String>,
        connection_id: impl Into<String>,
        iban: impl Into<String>,
        bic: impl Into<String>,
        holder_name: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            connection_id: connection_id.into(),
            iban: iban.into(),
            bic: bic.into(),
            holder_name: holder_name.into(),
            highest_seen_bank_message_id: 0,
        }
    }
}
