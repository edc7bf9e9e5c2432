//! Normalized transactions derived from raw bank messages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credit or debit, mirroring ISO 20022's `CdtDbtInd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Credit,
    Debit,
}

/// Booking status, mirroring ISO 20022's `Sts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Book,
    Pending,
}

/// A bank transaction code, in ISO form (`domain/family/subfamily`),
/// proprietary form (`issuer:code`), or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransactionCode {
    pub iso: Option<String>,
    pub proprietary: Option<String>,
}

/// A transaction derived from one `Ntry` (or, for batches, summarizing one
/// `Ntry`'s `NtryDtls`) in a downloaded camt.052/053 document.
///
/// Invariant: for every booked debit whose `end_to_end_id` matches a
/// prepared payment, a reconciliation link is established exactly once
/// (enforced by `gateway-core`, not by this type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub account_iban: String,
    /// Dedup/upsert key together with `account_iban`.
    pub bank_entry_reference: String,
    pub counterpart_iban: Option<String>,
    pub counterpart_bic: Option<String>,
    pub counterpart_name: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub booking_date_unix_ms: i64,
    pub value_date_unix_ms: Option<i64>,
    pub unstructured_remittance: String,
    pub direction: Direction,
    pub status: EntryStatus,
    pub is_batch: bool,
    pub bank_transaction_code: BankTransactionCode,
    pub end_to_end_id: Option<String>,
    /// Set once this transaction has been linked to a prepared payment by
    /// the reconciliation loop.
    pub reconciled_payment_id: Option<String>,
}

impl NormalizedTransaction {
    /// Signed amount: positive for credits, negative for debits. Satisfies
    /// `sum(credits) - sum(debits) == closing - opening` over one statement.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}
