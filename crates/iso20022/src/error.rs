//! ISO 20022 translation errors.

/// Errors raised while parsing camt.052/053 statements, or while
/// rendering pain.001.001.03 payment initiations.
#[derive(Debug, thiserror::Error)]
pub enum Iso20022Error {
    #[error("xml error: {0}")]
    Xml(#[from] gateway_xml::XmlError),
    #[error("invalid amount `{value}` in entry: {reason}")]
    InvalidAmount { value: String, reason: String },
    #[error("invalid date/time `{value}`: {reason}")]
    InvalidDateTime { value: String, reason: String },
    #[error("unrecognized credit/debit indicator: {0}")]
    InvalidCreditDebitIndicator(String),
    #[error("unrecognized entry status: {0}")]
    InvalidEntryStatus(String),
    #[error("document contains neither a camt.052 nor a camt.053 report")]
    UnrecognizedDocument,
}

pub type Iso20022Result<T> = Result<T, Iso20022Error>;
