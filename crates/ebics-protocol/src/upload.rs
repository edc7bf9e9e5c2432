//! CCT (`CustomerCreditTransferInitiation`) upload: sign the pain.001
//! order data with A006, compress and E002-encrypt it, then push it to
//! the bank across an initialisation/transfer round trip.

use gateway_xml::combinators::require_text_child;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::envelope::{b64_decode, b64_encode, parse_return_code, zlib_compress};
use crate::error::{ProtocolResult, check_return_code};
use crate::transport::BankTransport;

/// Key material needed to sign and encrypt an upload.
pub struct UploadIdentity<'a> {
    pub host_id: &'a str,
    pub partner_id: &'a str,
    pub user_id: &'a str,
    /// Signs the order data itself (`SignatureData`, A006 business signature).
    pub signature_private: &'a RsaPrivateKey,
    /// Signs the request header (`AuthSignature`, transport authentication).
    /// See the module-level note in [`crate::download`] on the X002/A006
    /// simplification.
    pub authentication_private: &'a RsaPrivateKey,
    pub bank_encryption_public: &'a RsaPublicKey,
}

/// Uploads `pain001_xml` as a CCT order. Returns the bank-assigned order
/// ID on success.
pub async fn upload_cct(
    transport: &dyn BankTransport,
    url: &str,
    identity: &UploadIdentity<'_>,
    pain001_xml: &[u8],
) -> ProtocolResult<String> {
    let digest = gateway_crypto::a006::digest_order_a006(pain001_xml);
    let signature = gateway_crypto::a006::sign_a006(identity.signature_private, &digest)?;

    let compressed = zlib_compress(pain001_xml)?;
    let envelope =
        gateway_crypto::e002::encrypt_e002(identity.bank_encryption_public, &compressed)?;

    let init_request = build_init_request(identity, &signature, &envelope)?;
    let init_response = transport.post(url, init_request).await?;
    let root = gateway_xml::parse(&init_response)?;
    let (code, text) = parse_return_code(&root)?;
    check_return_code(&code, &text)?;

    let order_id = require_text_child(&root, "OrderID")
        .ok()
        .unwrap_or("")
        .to_string();

    let transfer_request = build_transfer_request(identity, &envelope);
    let transfer_response = transport.post(url, transfer_request).await?;
    let transfer_root = gateway_xml::parse(&transfer_response)?;
    let (code, text) = parse_return_code(&transfer_root)?;
    check_return_code(&code, &text)?;

    Ok(order_id)
}

fn build_init_request(
    identity: &UploadIdentity<'_>,
    order_signature: &[u8],
    envelope: &gateway_crypto::e002::E002Envelope,
) -> ProtocolResult<Vec<u8>> {
    let header = format!(
        r#"<header authenticate="true">
    <static>
      <HostID>{host_id}</HostID>
      <PartnerID>{partner_id}</PartnerID>
      <UserID>{user_id}</UserID>
      <OrderDetails>
        <OrderType>CCT</OrderType>
        <OrderAttribute>OZHNN</OrderAttribute>
      </OrderDetails>
      <SecurityMedium>0000</SecurityMedium>
    </static>
    <mutable><TransactionPhase>Initialisation</TransactionPhase></mutable>
  </header>"#,
        host_id = identity.host_id,
        partner_id = identity.partner_id,
        user_id = identity.user_id,
    );
    let auth_signature = crate::signing::build_auth_signature(
        &gateway_xml::parse(header.as_bytes())?,
        identity.authentication_private,
    )?;

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsRequest xmlns="http://www.ebics.org/H004" Version="H004" Revision="1">
  {header}
  <AuthSignature>{auth_signature}</AuthSignature>
  <body>
    <DataTransfer>
      <DataEncryptionInfo><EncryptionPubKeyDigest Version="E002">{digest}</EncryptionPubKeyDigest><TransactionKey>{key}</TransactionKey></DataEncryptionInfo>
      <SignatureData>{order_signature}</SignatureData>
    </DataTransfer>
  </body>
</ebicsRequest>"#,
        order_signature = b64_encode(order_signature),
        digest = b64_encode(&envelope.recipient_key_digest),
        key = b64_encode(&envelope.encrypted_key),
    )
    .into_bytes())
}

fn build_transfer_request(
    identity: &UploadIdentity<'_>,
    envelope: &gateway_crypto::e002::E002Envelope,
) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsRequest xmlns="http://www.ebics.org/H004" Version="H004" Revision="1">
  <header authenticate="true">
    <static>
      <HostID>{host_id}</HostID>
    </static>
    <mutable><TransactionPhase>Transfer</TransactionPhase><SegmentNumber lastSegment="true">1</SegmentNumber></mutable>
  </header>
  <body>
    <DataTransfer>
      <OrderData>{data}</OrderData>
    </DataTransfer>
  </body>
</ebicsRequest>"#,
        host_id = identity.host_id,
        data = b64_encode(&envelope.ciphertext),
    )
    .into_bytes()
}

/// Decodes an `OrderData` element body produced by [`build_transfer_request`]
/// back to its ciphertext bytes — used by tests and by any fake bank that
/// needs to inspect what was uploaded.
pub fn decode_uploaded_order_data(xml: &[u8]) -> ProtocolResult<Vec<u8>> {
    let root = gateway_xml::parse(xml)?;
    let data_transfer = gateway_xml::combinators::require_unique_child(&root, "DataTransfer")
        .or_else(|_| {
            let body = gateway_xml::combinators::require_unique_child(&root, "body")?;
            gateway_xml::combinators::require_unique_child(body, "DataTransfer")
        })?;
    b64_decode(require_text_child(data_transfer, "OrderData")?)
}
