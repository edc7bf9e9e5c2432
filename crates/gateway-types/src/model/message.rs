//! Raw bank messages: the verbatim XML body of one downloaded camt document.

use serde::{Deserialize, Serialize};

/// The verbatim XML body of one downloaded camt document.
///
/// Deduplication key: `(connection_id, bank_message_id)` is unique.
/// Immutable once stored; retained for audit even if parsing later fails
/// (in which case `quarantined` is set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBankMessage {
    pub connection_id: String,
    pub bank_message_id: String,
    pub account_id: String,
    pub xml_body: String,
    pub quarantined: bool,
    pub quarantine_reason: Option<String>,
}

impl RawBankMessage {
    pub fn new(
        connection_id: impl Into<String>,
        bank_message_id: impl Into<String>,
        account_id: impl Into<String>,
        xml_body: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            bank_message_id: bank_message_id.into(),
            account_id: account_id.into(),
            xml_body: xml_body.into(),
            quarantined: false,
            quarantine_reason: None,
        }
    }

    pub fn quarantine(&mut self, reason: impl Into<String>) {
        self.quarantined = true;
        self.quarantine_reason = Some(reason.into());
    }
}
