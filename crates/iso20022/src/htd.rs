//! Parsing of the HTD order type's payload: the subscriber's available
//! bank accounts and authorizations, as `HTDResponseOrderData`.

use gateway_xml::combinators::{map_each_child, maybe_text_child, require_text_child, require_unique_child};

use crate::error::Iso20022Result;

/// One account entry from an HTD response. Marked `#[non_exhaustive]`
/// because banks are free to add further `PartnerInfo`/`AccountInfo`
/// fields this gateway does not yet surface.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtdAccountInfo {
    pub account_number_or_iban: String,
    pub bank_code_or_bic: String,
    pub account_holder: Option<String>,
    pub currency: Option<String>,
}

/// Parses the accounts listed under `HTDResponseOrderData/PartnerInfo/AccountInfo`.
pub fn parse_htd_accounts(bytes: &[u8]) -> Iso20022Result<Vec<HtdAccountInfo>> {
    let root = gateway_xml::parse(bytes)?;
    let partner_info = require_unique_child(&root, "PartnerInfo")?;
    map_each_child(partner_info, "AccountInfo", parse_account_info)
}

fn parse_account_info(account: &gateway_xml::Element) -> Iso20022Result<HtdAccountInfo> {
    let iban = maybe_text_child(account, "AccountNumber")?
        .or(maybe_text_child(account, "IBAN")?)
        .unwrap_or_default()
        .to_string();
    let bank_code = require_text_child(account, "BankCode")?.to_string();
    let holder = maybe_text_child(account, "AccountHolder")?.map(str::to_string);
    let currency = maybe_text_child(account, "Currency")?.map(str::to_string);

    Ok(HtdAccountInfo {
        account_number_or_iban: iban,
        bank_code_or_bic: bank_code,
        account_holder: holder,
        currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_info_entries() {
        let xml = br#"<HTDResponseOrderData>
            <PartnerInfo>
                <AccountInfo>
                    <AccountNumber>DE89370400440532013000</AccountNumber>
                    <BankCode>COBADEFFXXX</BankCode>
                    <AccountHolder>Jane Doe</AccountHolder>
                    <Currency>EUR</Currency>
                </AccountInfo>
            </PartnerInfo>
        </HTDResponseOrderData>"#;
        let accounts = parse_htd_accounts(xml).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_number_or_iban, "DE89370400440532013000");
        assert_eq!(accounts[0].account_holder.as_deref(), Some("Jane Doe"));
    }
}
