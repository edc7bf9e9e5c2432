//! camt.052 (account report) / camt.053 (account statement) parsing.
//!
//! Traversal follows the shape both message types share:
//! `Document` → `BkToCstmrAcctRpt` (camt.052) or `BkToCstmrStmt` (camt.053)
//! → one or more `Rpt`/`Stmt` → `Acct` (for the IBAN) and `Ntry` (one per
//! booking line, each optionally carrying `NtryDtls/TxDtls` for batches).

use gateway_types::model::transaction::{BankTransactionCode, Direction, EntryStatus, NormalizedTransaction};
use gateway_xml::combinators::{
    map_each_child, maybe_text_child, maybe_unique_child, require_text_child, require_unique_child,
};
use gateway_xml::dom::Element;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{Iso20022Error, Iso20022Result};

/// Parses a complete camt.052 or camt.053 document into normalized
/// transactions. `account_iban` is attached to every transaction returned
/// even when the document's own `Acct/Id/IBAN` disagrees, since the
/// gateway already knows which account it queried the statement for.
pub fn parse_camt(bytes: &[u8], account_iban: &str) -> Iso20022Result<Vec<NormalizedTransaction>> {
    let document = gateway_xml::parse(bytes)?;
    let report_root = maybe_unique_child(&document, "BkToCstmrAcctRpt")?
        .or(maybe_unique_child(&document, "BkToCstmrStmt")?)
        .ok_or(Iso20022Error::UnrecognizedDocument)?;

    let mut transactions = Vec::new();
    for section in report_sections(report_root) {
        for ntry in section.children_named("Ntry") {
            transactions.push(parse_entry(ntry, account_iban)?);
        }
    }
    Ok(transactions)
}

/// Opening and closing balances read from a statement's `Bal` entries
/// (`OPBD`/`CLBD` under `Tp/CdOrPrtry/Cd`), signed by `CdtDbtInd`.
///
/// For a camt.053 with both balances present, `sum(credits) - sum(debits)`
/// over its entries equals `closing - opening`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementBalances {
    pub opening: Option<Decimal>,
    pub closing: Option<Decimal>,
}

/// Parses the `Bal` entries of every `Rpt`/`Stmt` section in a camt.052/053
/// document into [`StatementBalances`]. Multiple sections' balances of the
/// same kind overwrite rather than sum — camt documents in this gateway's
/// corpus carry exactly one `Stmt` per account per message.
pub fn parse_balances(bytes: &[u8]) -> Iso20022Result<StatementBalances> {
    let document = gateway_xml::parse(bytes)?;
    let report_root = maybe_unique_child(&document, "BkToCstmrAcctRpt")?
        .or(maybe_unique_child(&document, "BkToCstmrStmt")?)
        .ok_or(Iso20022Error::UnrecognizedDocument)?;

    let mut balances = StatementBalances::default();
    for section in report_sections(report_root) {
        for bal in section.children_named("Bal") {
            let tp = require_unique_child(bal, "Tp")?;
            let cd_or_prtry = require_unique_child(tp, "CdOrPrtry")?;
            let code = maybe_text_child(cd_or_prtry, "Cd")?.unwrap_or_default();
            if code != "OPBD" && code != "CLBD" {
                continue;
            }

            let amt_element = require_unique_child(bal, "Amt")?;
            let amount = parse_decimal(amt_element.text_trimmed())?;
            let direction = parse_direction(require_unique_child(bal, "CdtDbtInd")?.text_trimmed())?;
            let signed = match direction {
                Direction::Credit => amount,
                Direction::Debit => -amount,
            };

            match code {
                "OPBD" => balances.opening = Some(signed),
                "CLBD" => balances.closing = Some(signed),
                _ => unreachable!("filtered above"),
            }
        }
    }
    Ok(balances)
}

/// Extracts `GrpHdr/MsgId` from a camt.052/053 document — the bank's
/// identifier for this message, used as the dedup key for raw bank
/// messages.
pub fn extract_message_id(bytes: &[u8]) -> Iso20022Result<String> {
    let document = gateway_xml::parse(bytes)?;
    let report_root = maybe_unique_child(&document, "BkToCstmrAcctRpt")?
        .or(maybe_unique_child(&document, "BkToCstmrStmt")?)
        .ok_or(Iso20022Error::UnrecognizedDocument)?;
    let grp_hdr = require_unique_child(report_root, "GrpHdr")?;
    Ok(require_text_child(grp_hdr, "MsgId")?.to_string())
}

/// Returns the `Rpt` (camt.052) or `Stmt` (camt.053) elements, whichever
/// the document carries.
fn report_sections(report_root: &Element) -> Vec<&Element> {
    let rpts: Vec<&Element> = report_root.children_named("Rpt").collect();
    if !rpts.is_empty() {
        return rpts;
    }
    report_root.children_named("Stmt").collect()
}

fn parse_entry(ntry: &Element, account_iban: &str) -> Iso20022Result<NormalizedTransaction> {
    let amt_element = require_unique_child(ntry, "Amt")?;
    let currency = amt_element
        .attr("Ccy")
        .unwrap_or_default()
        .to_string();
    let amount = parse_decimal(amt_element.text_trimmed())?;

    let direction = parse_direction(require_unique_child(ntry, "CdtDbtInd")?.text_trimmed())?;
    let status = parse_status(require_unique_child(ntry, "Sts")?.text_trimmed())?;

    let booking_date_unix_ms = maybe_unique_child(ntry, "BookgDt")?
        .map(parse_date_container)
        .transpose()?
        .unwrap_or(0);
    let value_date_unix_ms = maybe_unique_child(ntry, "ValDt")?
        .map(parse_date_container)
        .transpose()?;

    let bank_entry_reference = maybe_text_child(ntry, "NtryRef")?
        .or(maybe_text_child(ntry, "AcctSvcrRef")?)
        .unwrap_or_default()
        .to_string();

    let bank_transaction_code = maybe_unique_child(ntry, "BkTxCd")?
        .map(parse_bank_transaction_code)
        .transpose()?
        .unwrap_or_default();

    let tx_details = entry_tx_details(ntry)?;
    let is_batch = tx_details.len() > 1;

    // A batched entry carries one `TxDtls` per underlying transaction; none
    // of them is privileged, so every one is consulted rather than just the
    // first, or a later record's end-to-end id (the reconciliation key)
    // would be silently lost.
    let mut counterpart_iban = None;
    let mut counterpart_bic = None;
    let mut counterpart_name = None;
    let mut end_to_end_id = None;
    let mut remittance_parts = Vec::new();
    for tx in &tx_details {
        let (iban, bic, name, remittance, e2e) = parse_tx_details(tx, direction)?;
        counterpart_iban = counterpart_iban.or(iban);
        counterpart_bic = counterpart_bic.or(bic);
        counterpart_name = counterpart_name.or(name);
        end_to_end_id = end_to_end_id.or(e2e);
        if !remittance.is_empty() {
            remittance_parts.push(remittance);
        }
    }
    let unstructured_remittance = remittance_parts.concat();

    Ok(NormalizedTransaction {
        account_iban: account_iban.to_string(),
        bank_entry_reference,
        counterpart_iban,
        counterpart_bic,
        counterpart_name,
        amount,
        currency,
        booking_date_unix_ms,
        value_date_unix_ms,
        unstructured_remittance,
        direction,
        status,
        is_batch,
        bank_transaction_code,
        end_to_end_id,
        reconciled_payment_id: None,
    })
}

fn entry_tx_details(ntry: &Element) -> Iso20022Result<Vec<&Element>> {
    let mut details = Vec::new();
    for ntry_dtls in ntry.children_named("NtryDtls") {
        details.extend(ntry_dtls.children_named("TxDtls"));
    }
    Ok(details)
}

fn parse_tx_details(
    tx: &Element,
    direction: Direction,
) -> Iso20022Result<(Option<String>, Option<String>, Option<String>, String, Option<String>)> {
    let end_to_end_id = maybe_unique_child(tx, "Refs")?
        .map(|refs| maybe_text_child(refs, "EndToEndId"))
        .transpose()?
        .flatten()
        .filter(|id| *id != "NOTPROVIDED")
        .map(str::to_string);

    let unstructured_remittance = maybe_unique_child(tx, "RmtInf")?
        .map(|rmt| {
            map_each_child(rmt, "Ustrd", |e| Ok(e.text_trimmed().to_string()))
        })
        .transpose()?
        .map(|parts| parts.concat())
        .unwrap_or_default();

    let counterpart_party_name = maybe_unique_child(tx, "RltdPties")?
        .map(|parties| parse_counterpart(parties, direction))
        .transpose()?
        .unwrap_or((None, None, None));

    Ok((
        counterpart_party_name.0,
        counterpart_party_name.1,
        counterpart_party_name.2,
        unstructured_remittance,
        end_to_end_id,
    ))
}

/// A credit entry's counterpart is the debtor; a debit entry's
/// counterpart is the creditor.
fn parse_counterpart(
    related_parties: &Element,
    direction: Direction,
) -> Iso20022Result<(Option<String>, Option<String>, Option<String>)> {
    let (party_tag, account_tag) = match direction {
        Direction::Credit => ("Dbtr", "DbtrAcct"),
        Direction::Debit => ("Cdtr", "CdtrAcct"),
    };

    let name = maybe_unique_child(related_parties, party_tag)?
        .map(|party| maybe_text_child(party, "Nm"))
        .transpose()?
        .flatten()
        .map(str::to_string);

    let iban = maybe_unique_child(related_parties, account_tag)?
        .map(|acct| require_unique_child(acct, "Id"))
        .transpose()?
        .map(|id| maybe_text_child(id, "IBAN"))
        .transpose()?
        .flatten()
        .map(str::to_string);

    Ok((iban, None, name))
}

fn parse_bank_transaction_code(bk_tx_cd: &Element) -> Iso20022Result<BankTransactionCode> {
    let iso = maybe_unique_child(bk_tx_cd, "Domn")?
        .map(|domn| -> Iso20022Result<String> {
            let code = maybe_text_child(domn, "Cd")?.unwrap_or_default();
            let fmly = require_unique_child(domn, "Fmly")?;
            let fmly_cd = maybe_text_child(fmly, "Cd")?.unwrap_or_default();
            let sub_fmly_cd = maybe_text_child(fmly, "SubFmlyCd")?.unwrap_or_default();
            Ok(format!("{code}/{fmly_cd}/{sub_fmly_cd}"))
        })
        .transpose()?;

    let proprietary = maybe_unique_child(bk_tx_cd, "Prtry")?
        .map(|prtry| maybe_text_child(prtry, "Cd"))
        .transpose()?
        .flatten()
        .map(str::to_string);

    Ok(BankTransactionCode { iso, proprietary })
}

fn parse_decimal(value: &str) -> Iso20022Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Iso20022Error::InvalidAmount {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_direction(value: &str) -> Iso20022Result<Direction> {
    match value {
        "CRDT" => Ok(Direction::Credit),
        "DBIT" => Ok(Direction::Debit),
        other => Err(Iso20022Error::InvalidCreditDebitIndicator(other.to_string())),
    }
}

fn parse_status(value: &str) -> Iso20022Result<EntryStatus> {
    match value {
        "BOOK" => Ok(EntryStatus::Book),
        "PDNG" => Ok(EntryStatus::Pending),
        other => Err(Iso20022Error::InvalidEntryStatus(other.to_string())),
    }
}

/// Parses a `BookgDt`/`ValDt`-shaped container (`Dt` or `DtTm` child) into
/// Unix milliseconds.
fn parse_date_container(container: &Element) -> Iso20022Result<i64> {
    let raw = maybe_text_child(container, "DtTm")?
        .or(maybe_text_child(container, "Dt")?)
        .ok_or_else(|| Iso20022Error::InvalidDateTime {
            value: String::new(),
            reason: "missing Dt/DtTm".to_string(),
        })?;
    parse_iso_date_or_datetime(raw)
}

fn parse_iso_date_or_datetime(raw: &str) -> Iso20022Result<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time")
            .and_utc()
            .timestamp_millis());
    }
    Err(Iso20022Error::InvalidDateTime {
        value: raw.to_string(),
        reason: "not a valid ISO 8601 date or date-time".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camt053_two_entries() -> Vec<u8> {
        br#"<Document>
          <BkToCstmrStmt>
            <GrpHdr><MsgId>STMT-MSG-1</MsgId></GrpHdr>
            <Stmt>
              <Acct><Id><IBAN>DE89370400440532013000</IBAN></Id></Acct>
              <Bal>
                <Tp><CdOrPrtry><Cd>OPBD</Cd></CdOrPrtry></Tp>
                <Amt Ccy="EUR">1000.00</Amt>
                <CdtDbtInd>CRDT</CdtDbtInd>
              </Bal>
              <Bal>
                <Tp><CdOrPrtry><Cd>CLBD</Cd></CdOrPrtry></Tp>
                <Amt Ccy="EUR">1050.00</Amt>
                <CdtDbtInd>CRDT</CdtDbtInd>
              </Bal>
              <Ntry>
                <NtryRef>REF-1</NtryRef>
                <Amt Ccy="EUR">100.00</Amt>
                <CdtDbtInd>CRDT</CdtDbtInd>
                <Sts>BOOK</Sts>
                <BookgDt><Dt>2026-07-20</Dt></BookgDt>
                <NtryDtls>
                  <TxDtls>
                    <Refs><EndToEndId>e2e-1</EndToEndId></Refs>
                    <RltdPties><Dbtr><Nm>Jane Payer</Nm></Dbtr></RltdPties>
                    <RmtInf><Ustrd>invoice 1</Ustrd></RmtInf>
                  </TxDtls>
                </NtryDtls>
              </Ntry>
              <Ntry>
                <NtryRef>REF-2</NtryRef>
                <Amt Ccy="EUR">50.00</Amt>
                <CdtDbtInd>DBIT</CdtDbtInd>
                <Sts>BOOK</Sts>
                <BookgDt><Dt>2026-07-21</Dt></BookgDt>
                <NtryDtls>
                  <TxDtls>
                    <RltdPties><Cdtr><Nm>Vendor Co</Nm></Cdtr></RltdPties>
                  </TxDtls>
                  <TxDtls>
                    <RltdPties><Cdtr><Nm>Vendor Co 2</Nm></Cdtr></RltdPties>
                  </TxDtls>
                </NtryDtls>
              </Ntry>
            </Stmt>
          </BkToCstmrStmt>
        </Document>"#
            .to_vec()
    }

    #[test]
    fn parses_two_entries_with_correct_directions_and_batching() {
        let transactions = parse_camt(&camt053_two_entries(), "DE89370400440532013000").unwrap();
        assert_eq!(transactions.len(), 2);

        let credit = &transactions[0];
        assert_eq!(credit.direction, Direction::Credit);
        assert_eq!(credit.amount, Decimal::new(10000, 2));
        assert!(!credit.is_batch);
        assert_eq!(credit.counterpart_name.as_deref(), Some("Jane Payer"));
        assert_eq!(credit.end_to_end_id.as_deref(), Some("e2e-1"));

        let debit = &transactions[1];
        assert_eq!(debit.direction, Direction::Debit);
        assert!(debit.is_batch);
    }

    #[test]
    fn extracts_group_header_message_id() {
        let message_id = extract_message_id(&camt053_two_entries()).unwrap();
        assert_eq!(message_id, "STMT-MSG-1");
    }

    #[test]
    fn signed_amount_nets_to_balance_delta() {
        let transactions = parse_camt(&camt053_two_entries(), "DE89370400440532013000").unwrap();
        let net: Decimal = transactions.iter().map(|t| t.signed_amount()).sum();
        assert_eq!(net, Decimal::new(5000, 2));

        let balances = parse_balances(&camt053_two_entries()).unwrap();
        let opening = balances.opening.unwrap();
        let closing = balances.closing.unwrap();
        assert_eq!(net, closing - opening);
    }

    #[test]
    fn batched_return_concatenates_unstructured_remittance_with_no_separator() {
        let document = br#"<Document>
          <BkToCstmrStmt>
            <GrpHdr><MsgId>STMT-MSG-2</MsgId></GrpHdr>
            <Stmt>
              <Acct><Id><IBAN>DE89370400440532013000</IBAN></Id></Acct>
              <Ntry>
                <NtryRef>REF-3</NtryRef>
                <Amt Ccy="EUR">75.00</Amt>
                <CdtDbtInd>CRDT</CdtDbtInd>
                <Sts>BOOK</Sts>
                <BookgDt><Dt>2026-07-22</Dt></BookgDt>
                <BkTxCd><Domn><Cd>PMNT</Cd><Fmly><Cd>ICDT</Cd><SubFmlyCd>RRTN</SubFmlyCd></Fmly></Domn></BkTxCd>
                <NtryDtls>
                  <TxDtls>
                    <RmtInf><Ustrd>part one</Ustrd><Ustrd>part two</Ustrd></RmtInf>
                  </TxDtls>
                  <TxDtls>
                    <RmtInf><Ustrd>other detail</Ustrd></RmtInf>
                  </TxDtls>
                </NtryDtls>
              </Ntry>
            </Stmt>
          </BkToCstmrStmt>
        </Document>"#
            .to_vec();

        let transactions = parse_camt(&document, "DE89370400440532013000").unwrap();
        assert_eq!(transactions.len(), 1);
        let entry = &transactions[0];
        assert!(entry.is_batch);
        assert_eq!(
            entry.bank_transaction_code.iso.as_deref(),
            Some("PMNT/ICDT/RRTN")
        );
        assert_eq!(entry.unstructured_remittance, "part onepart twoother detail");
    }

    #[test]
    fn batched_entry_finds_end_to_end_id_in_a_later_tx_dtls() {
        let document = br#"<Document>
          <BkToCstmrStmt>
            <GrpHdr><MsgId>STMT-MSG-3</MsgId></GrpHdr>
            <Stmt>
              <Acct><Id><IBAN>DE89370400440532013000</IBAN></Id></Acct>
              <Ntry>
                <NtryRef>REF-4</NtryRef>
                <Amt Ccy="EUR">30.00</Amt>
                <CdtDbtInd>DBIT</CdtDbtInd>
                <Sts>BOOK</Sts>
                <BookgDt><Dt>2026-07-23</Dt></BookgDt>
                <NtryDtls>
                  <TxDtls>
                    <RltdPties><Cdtr><Nm>Vendor A</Nm></Cdtr></RltdPties>
                  </TxDtls>
                  <TxDtls>
                    <Refs><EndToEndId>e2e-batched</EndToEndId></Refs>
                    <RltdPties><Cdtr><Nm>Vendor B</Nm></Cdtr></RltdPties>
                  </TxDtls>
                </NtryDtls>
              </Ntry>
            </Stmt>
          </BkToCstmrStmt>
        </Document>"#
            .to_vec();

        let transactions = parse_camt(&document, "DE89370400440532013000").unwrap();
        assert_eq!(transactions.len(), 1);
        let entry = &transactions[0];
        assert!(entry.is_batch);
        assert_eq!(entry.end_to_end_id.as_deref(), Some("e2e-batched"));
        assert_eq!(entry.counterpart_name.as_deref(), Some("Vendor A"));
    }
}
