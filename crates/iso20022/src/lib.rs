#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! ISO 20022 translation between downloaded camt.052/053 statements and
//! [`gateway_types::model::transaction::NormalizedTransaction`], and
//! between [`gateway_types::model::payment::PreparedPayment`] and
//! pain.001.001.03 payment initiation documents.
//!
//! # Modules
//!
//! - [`camt`] - camt.052/053 parsing
//! - [`pain001`] - pain.001.001.03 emission
//! - [`htd`] - HTD (account directory) parsing
//! - [`error`] - The [`error::Iso20022Error`] taxonomy

pub mod camt;
pub mod error;
pub mod htd;
pub mod pain001;

pub use camt::{StatementBalances, extract_message_id, parse_balances, parse_camt};
pub use error::{Iso20022Error, Iso20022Result};
pub use pain001::{ParsedCreditTransfer, parse_pain001, render_pain001};
