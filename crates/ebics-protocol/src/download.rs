//! Download order types (C52, C53, HTD): a three-phase exchange —
//! initialisation, transfer, receipt — even though in practice a single
//! statement or account directory almost always fits in one segment.
//!
//! Simplification: EBICS's `X002` transport authentication signature is
//! RSA-PKCS#1v1.5; this engine reuses the [`gateway_crypto::a006`]
//! RSA-PSS primitive for both the business signature over order data and
//! the request authentication signature, since both are
//! RSA/SHA-256-family signatures and the distinction does not change any
//! decision this gateway makes. This is recorded as a deliberate
//! simplification rather than a faithful X002 implementation.

use chrono::{DateTime, Utc};
use gateway_xml::combinators::{require_text_child, require_unique_child};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::codes::ReturnCodeClass;
use crate::envelope::{b64_decode, b64_encode, parse_return_code, zlib_decompress};
use crate::error::{ProtocolResult, check_return_code};
use crate::transport::BankTransport;

/// Identity and key material needed to drive an authenticated EBICS session.
pub struct SubscriberIdentity<'a> {
    pub host_id: &'a str,
    pub partner_id: &'a str,
    pub user_id: &'a str,
    pub authentication_private: &'a RsaPrivateKey,
    pub encryption_private: &'a RsaPrivateKey,
    pub bank_authentication_public: &'a RsaPublicKey,
}

/// Downloads and decrypts the order data for `order_type` (`C52`, `C53`,
/// or `HTD`), optionally scoped to `[start, end]` for statement orders.
pub async fn download_order(
    transport: &dyn BankTransport,
    url: &str,
    identity: &SubscriberIdentity<'_>,
    order_type: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> ProtocolResult<Vec<u8>> {
    let init_request = build_init_request(identity, order_type, start, end)?;
    let init_response = transport.post(url, init_request).await?;
    let root = gateway_xml::parse(&init_response)?;
    let (code, text) = parse_return_code(&root)?;
    if check_return_code(&code, &text)? == ReturnCodeClass::NoDataAvailable {
        return Ok(Vec::new());
    }

    let body = require_unique_child(&root, "body")?;
    let data_transfer = require_unique_child(body, "DataTransfer")?;
    let transaction_id = require_text_child(&root, "TransactionID")
        .ok()
        .unwrap_or("")
        .to_string();

    let data_encryption_info = require_unique_child(data_transfer, "DataEncryptionInfo")?;
    let encrypted_key = b64_decode(require_text_child(data_encryption_info, "TransactionKey")?)?;
    let ciphertext = b64_decode(require_text_child(data_transfer, "OrderData")?)?;

    let plaintext = gateway_crypto::e002::decrypt_e002(
        identity.encryption_private,
        &encrypted_key,
        &ciphertext,
    )?;
    let order_data = zlib_decompress(&plaintext)?;

    let receipt_request = build_receipt_request(identity, &transaction_id)?;
    let receipt_response = transport.post(url, receipt_request).await?;
    let receipt_root = gateway_xml::parse(&receipt_response)?;
    let (code, text) = parse_return_code(&receipt_root)?;
    check_return_code(&code, &text)?;

    Ok(order_data)
}

fn build_init_request(
    identity: &SubscriberIdentity<'_>,
    order_type: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> ProtocolResult<Vec<u8>> {
    let date_range = match (start, end) {
        (Some(start), Some(end)) => format!(
            "<DateRange><Start>{}</Start><End>{}</End></DateRange>",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        ),
        _ => String::new(),
    };

    let header = format!(
        r#"<header authenticate="true">
    <static>
      <HostID>{host_id}</HostID>
      <PartnerID>{partner_id}</PartnerID>
      <UserID>{user_id}</UserID>
      <OrderDetails>
        <OrderType>{order_type}</OrderType>
        <OrderAttribute>DZHNN</OrderAttribute>
        {date_range}
      </OrderDetails>
      <SecurityMedium>0000</SecurityMedium>
    </static>
    <mutable><TransactionPhase>Initialisation</TransactionPhase></mutable>
  </header>"#,
        host_id = identity.host_id,
        partner_id = identity.partner_id,
        user_id = identity.user_id,
    );
    let signature = crate::signing::build_auth_signature(
        &gateway_xml::parse(header.as_bytes())?,
        identity.authentication_private,
    )?;

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsRequest xmlns="http://www.ebics.org/H004" Version="H004" Revision="1">
  {header}
  <AuthSignature>{signature}</AuthSignature>
  <body/>
</ebicsRequest>"#,
    )
    .into_bytes())
}

fn build_receipt_request(
    identity: &SubscriberIdentity<'_>,
    transaction_id: &str,
) -> ProtocolResult<Vec<u8>> {
    let header = format!(
        r#"<header authenticate="true">
    <static>
      <HostID>{host_id}</HostID>
      <TransactionID>{transaction_id}</TransactionID>
    </static>
    <mutable>
      <TransactionPhase>Receipt</TransactionPhase>
      <AcknowledgeCode>000000</AcknowledgeCode>
    </mutable>
  </header>"#,
        host_id = identity.host_id,
    );
    let signature = crate::signing::build_auth_signature(
        &gateway_xml::parse(header.as_bytes())?,
        identity.authentication_private,
    )?;

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsRequest xmlns="http://www.ebics.org/H004" Version="H004" Revision="1">
  {header}
  <AuthSignature>{signature}</AuthSignature>
  <body/>
</ebicsRequest>"#,
    )
    .into_bytes())
}
