//! Prepared payment (payment initiation) records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A prepared, not-yet-submitted (or already-submitted) payment initiation.
///
/// Immutable at creation except for the lifecycle flags `submitted`,
/// `invalid`, and `submission_timestamp`. Once `submitted` is `true`, the
/// tuple (creditor IBAN, amount, currency, subject, preparation timestamp)
/// is frozen — callers must not mutate those fields afterward, and this
/// type offers no setters for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedPayment {
    pub payment_id: String,
    pub connection_id: String,
    pub debtor_account_id: String,

    pub creditor_iban: String,
    pub creditor_bic: String,
    pub creditor_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub remittance_subject: String,
    pub preparation_timestamp: DateTime<Utc>,

    pub end_to_end_id: String,
    pub payment_information_id: String,
    pub message_id: String,

    pub submitted: bool,
    pub invalid: bool,
    pub submission_timestamp: Option<DateTime<Utc>>,
    pub invalid_reason: Option<String>,
}

impl PreparedPayment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payment_id: impl Into<String>,
        connection_id: impl Into<String>,
        debtor_account_id: impl Into<String>,
        creditor_iban: impl Into<String>,
        creditor_bic: impl Into<String>,
        creditor_name: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        remittance_subject: impl Into<String>,
        preparation_timestamp: DateTime<Utc>,
        end_to_end_id: impl Into<String>,
        payment_information_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            payment_id: payment_id.into(),
            connection_id: connection_id.into(),
            debtor_account_id: debtor_account_id.into(),
            creditor_iban: creditor_iban.into(),
            creditor_bic: creditor_bic.into(),
            creditor_name: creditor_name.into(),
            amount,
            currency: currency.into(),
            remittance_subject: remittance_subject.into(),
            preparation_timestamp,
            end_to_end_id: end_to_end_id.into(),
            payment_information_id: payment_information_id.into(),
            message_id: message_id.into(),
            submitted: false,
            invalid: false,
            submission_timestamp: None,
            invalid_reason: None,
        }
    }

    /// Whether this payment is still a candidate for the submission sweep:
    /// `submitted=false AND invalid=false`.
    pub fn is_submittable(&self) -> bool {
        !self.submitted && !self.invalid
    }

    pub fn mark_submitted(&mut self, at: DateTime<Utc>) {
        self.submitted = true;
        self.submission_timestamp = Some(at);
    }

    pub fn mark_invalid(&mut self, reason: impl Into<String>) {
        self.invalid = true;
        self.invalid_reason = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PreparedPayment {
        PreparedPayment::new(
            "pay-1",
            "conn-1",
            "acc-1",
            "DE89370400440532013000",
            "COBADEFFXXX",
            "Jane Doe",
            Decimal::new(1000, 2),
            "EUR",
            "invoice 42",
            Utc::now(),
            "e2e-1",
            "pmtinf-1",
            "msg-1",
        )
    }

    #[test]
    fn submittable_until_submitted_or_invalid() {
        let mut payment = sample();
        assert!(payment.is_submittable());
        payment.mark_submitted(Utc::now());
        assert!(!payment.is_submittable());

        let mut payment = sample();
        payment.mark_invalid("bad BIC");
        assert!(!payment.is_submittable());
    }
}
