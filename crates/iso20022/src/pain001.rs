//! pain.001.001.03 (`CustomerCreditTransferInitiation`) emission.
//!
//! The gateway only ever emits single-transaction payment information
//! blocks (one `PmtInf` per `PreparedPayment`), so `NbOfTxs` is always
//! `1` and `CtrlSum` always equals the single transaction's amount.
//! Batching multiple prepared payments into one `PmtInf` is left to a
//! future iteration of the submission sweep.

use chrono::{DateTime, Utc};
use gateway_types::model::account::BankAccount;
use gateway_types::model::payment::PreparedPayment;
use gateway_xml::combinators::{require_text_child, require_unique_child};

use crate::error::{Iso20022Error, Iso20022Result};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const NAMESPACE: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03";

/// The handful of fields a downstream reconciler cares about recovering
/// from a rendered pain.001 document, used in tests to check the
/// emit/parse round trip and available to anything that needs to inspect
/// an already-rendered initiation without re-deriving it from the
/// [`PreparedPayment`] that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCreditTransfer {
    pub creditor_iban: String,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub remittance_subject: String,
    pub end_to_end_id: String,
}

/// Parses a rendered pain.001.001.03 document back into its single
/// credit-transfer transaction.
pub fn parse_pain001(xml: &str) -> Iso20022Result<ParsedCreditTransfer> {
    let document = gateway_xml::parse(xml.as_bytes())?;
    let cstmr_cdt_trf_initn = require_unique_child(&document, "CstmrCdtTrfInitn")?;
    let pmt_inf = require_unique_child(cstmr_cdt_trf_initn, "PmtInf")?;
    let cdt_trf_tx_inf = require_unique_child(pmt_inf, "CdtTrfTxInf")?;

    let pmt_id = require_unique_child(cdt_trf_tx_inf, "PmtId")?;
    let end_to_end_id = require_text_child(pmt_id, "EndToEndId")?.to_string();

    let amt = require_unique_child(cdt_trf_tx_inf, "Amt")?;
    let instd_amt = require_unique_child(amt, "InstdAmt")?;
    let currency = instd_amt.attr("Ccy").unwrap_or_default().to_string();
    let amount = instd_amt
        .text_trimmed()
        .parse::<rust_decimal::Decimal>()
        .map_err(|e| Iso20022Error::InvalidAmount {
            value: instd_amt.text_trimmed().to_string(),
            reason: e.to_string(),
        })?;

    let cdtr_acct = require_unique_child(cdt_trf_tx_inf, "CdtrAcct")?;
    let cdtr_id = require_unique_child(cdtr_acct, "Id")?;
    let creditor_iban = require_text_child(cdtr_id, "IBAN")?.to_string();

    let rmt_inf = require_unique_child(cdt_trf_tx_inf, "RmtInf")?;
    let remittance_subject = require_text_child(rmt_inf, "Ustrd")?.to_string();

    Ok(ParsedCreditTransfer {
        creditor_iban,
        amount,
        currency,
        remittance_subject,
        end_to_end_id,
    })
}

/// Renders a pain.001.001.03 document initiating exactly one credit
/// transfer from `debtor` for `payment`.
pub fn render_pain001(payment: &PreparedPayment, debtor: &BankAccount) -> String {
    let created = payment.preparation_timestamp;
    let execution_date = payment.preparation_timestamp.date_naive();
    let amount = format_amount(payment.amount);

    format!(
        r#"{XML_HEADER}
<Document xmlns="{NAMESPACE}">
  <CstmrCdtTrfInitn>
    <GrpHdr>
      <MsgId>{msg_id}</MsgId>
      <CreDtTm>{created_dt_tm}</CreDtTm>
      <NbOfTxs>1</NbOfTxs>
      <CtrlSum>{amount}</CtrlSum>
      <InitgPty><Nm>{debtor_name}</Nm></InitgPty>
    </GrpHdr>
    <PmtInf>
      <PmtInfId>{pmt_inf_id}</PmtInfId>
      <PmtMtd>TRF</PmtMtd>
      <BtchBookg>true</BtchBookg>
      <NbOfTxs>1</NbOfTxs>
      <CtrlSum>{amount}</CtrlSum>
      <ReqdExctnDt>{execution_date}</ReqdExctnDt>
      <Dbtr><Nm>{debtor_name}</Nm></Dbtr>
      <DbtrAcct><Id><IBAN>{debtor_iban}</IBAN></Id></DbtrAcct>
      <DbtrAgt><FinInstnId><BIC>{debtor_bic}</BIC></FinInstnId></DbtrAgt>
      <ChrgBr>SLEV</ChrgBr>
      <CdtTrfTxInf>
        <PmtId>
          <EndToEndId>{end_to_end_id}</EndToEndId>
        </PmtId>
        <Amt><InstdAmt Ccy="{currency}">{amount}</InstdAmt></Amt>
        <CdtrAgt><FinInstnId><BIC>{creditor_bic}</BIC></FinInstnId></CdtrAgt>
        <Cdtr><Nm>{creditor_name}</Nm></Cdtr>
        <CdtrAcct><Id><IBAN>{creditor_iban}</IBAN></Id></CdtrAcct>
        <RmtInf><Ustrd>{remittance}</Ustrd></RmtInf>
      </CdtTrfTxInf>
    </PmtInf>
  </CstmrCdtTrfInitn>
</Document>"#,
        msg_id = escape(&payment.message_id),
        created_dt_tm = format_datetime(created),
        debtor_name = escape(&debtor.holder_name),
        pmt_inf_id = escape(&payment.payment_information_id),
        execution_date = execution_date.format("%Y-%m-%d"),
        debtor_iban = escape(&debtor.iban),
        debtor_bic = escape(&debtor.bic),
        end_to_end_id = escape(&payment.end_to_end_id),
        currency = escape(&payment.currency),
        creditor_bic = escape(&payment.creditor_bic),
        creditor_name = escape(&payment.creditor_name),
        creditor_iban = escape(&payment.creditor_iban),
        remittance = escape(&payment.remittance_subject),
    )
}

fn format_amount(amount: rust_decimal::Decimal) -> String {
    format!("{:.2}", amount)
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sample_payment() -> PreparedPayment {
        PreparedPayment::new(
            "pay-1",
            "conn-1",
            "acc-1",
            "FR1420041010050500013M02606",
            "PSSTFRPPPAR",
            "Creditor Name",
            Decimal::new(12345, 2),
            "EUR",
            "invoice 42",
            Utc::now(),
            "e2e-1",
            "pmtinf-1",
            "msg-1",
        )
    }

    fn sample_debtor() -> BankAccount {
        BankAccount::new(
            "acc-1",
            "conn-1",
            "DE89370400440532013000",
            "COBADEFFXXX",
            "Debtor & Co",
        )
    }

    #[test]
    fn renders_single_transaction_payment_information() {
        let rendered = render_pain001(&sample_payment(), &sample_debtor());
        assert!(rendered.contains("<NbOfTxs>1</NbOfTxs>"));
        assert!(rendered.contains("<CtrlSum>123.45</CtrlSum>"));
        assert!(rendered.contains("<PmtMtd>TRF</PmtMtd>"));
        assert!(rendered.contains("<BtchBookg>true</BtchBookg>"));
        assert!(rendered.contains("Debtor &amp; Co"));
        assert!(rendered.contains("<IBAN>FR1420041010050500013M02606</IBAN>"));
        assert!(rendered.contains("<ChrgBr>SLEV</ChrgBr>"));
    }

    #[test]
    fn emit_then_parse_recovers_the_input_fields() {
        let payment = sample_payment();
        let rendered = render_pain001(&payment, &sample_debtor());
        let parsed = parse_pain001(&rendered).unwrap();

        assert_eq!(parsed.creditor_iban, payment.creditor_iban);
        assert_eq!(parsed.amount, payment.amount);
        assert_eq!(parsed.currency, payment.currency);
        assert_eq!(parsed.remittance_subject, payment.remittance_subject);
        assert_eq!(parsed.end_to_end_id, payment.end_to_end_id);
    }

    #[test]
    fn escaped_creditor_name_round_trips_through_xml_entities() {
        let mut payment = sample_payment();
        payment.creditor_name = "A & B GmbH".to_string();
        let rendered = render_pain001(&payment, &sample_debtor());
        assert!(rendered.contains("A &amp; B GmbH"));
        let parsed = parse_pain001(&rendered).unwrap();
        assert_eq!(parsed.creditor_iban, payment.creditor_iban);
    }
}
