//! INI (signature key), HIA (authentication + encryption keys), and HPB
//! (bank key download) — the three order types that make up EBICS key
//! exchange. INI and HIA are unauthenticated (`ebicsUnsecuredRequest`):
//! there is no prior trust relationship yet, so the subscriber simply
//! submits its own freshly generated public keys and waits for the bank's
//! human operator to confirm them out of band. HPB is a regular
//! authenticated download once INI/HIA have been confirmed.

use chrono::Utc;
use gateway_crypto::CryptoError;
use gateway_xml::combinators::{require_text_child, require_unique_child};
use rsa::RsaPublicKey;
use rsa::traits::PublicKeyParts;

use crate::envelope::{b64_decode, b64_encode, parse_return_code, zlib_compress, zlib_decompress};
use crate::error::{ProtocolError, ProtocolResult, check_return_code};
use crate::transport::BankTransport;

fn rsa_key_value_xml(key: &RsaPublicKey) -> String {
    format!(
        "<PubKeyValue><RSAKeyValue xmlns=\"http://www.w3.org/2000/09/xmldsig#\"><Modulus>{}</Modulus><Exponent>{}</Exponent></RSAKeyValue><TimeStamp>{}</TimeStamp></PubKeyValue>",
        b64_encode(&key.n().to_bytes_be()),
        b64_encode(&key.e().to_bytes_be()),
        Utc::now().to_rfc3339(),
    )
}

fn ini_order_data(signature_public: &RsaPublicKey, partner_id: &str, user_id: &str) -> Vec<u8> {
    format!(
        r#"<SignaturePubKeyOrderData xmlns="http://www.ebics.org/S001">
  <SignaturePubKeyInfo>
    {key}
    <SignatureVersion>A006</SignatureVersion>
  </SignaturePubKeyInfo>
  <PartnerID>{partner_id}</PartnerID>
  <UserID>{user_id}</UserID>
</SignaturePubKeyOrderData>"#,
        key = rsa_key_value_xml(signature_public),
    )
    .into_bytes()
}

fn hia_order_data(
    authentication_public: &RsaPublicKey,
    encryption_public: &RsaPublicKey,
    partner_id: &str,
    user_id: &str,
) -> Vec<u8> {
    format!(
        r#"<HIARequestOrderData xmlns="http://www.ebics.org/H003">
  <AuthenticationPubKeyInfo>
    {auth_key}
    <AuthenticationVersion>X002</AuthenticationVersion>
  </AuthenticationPubKeyInfo>
  <EncryptionPubKeyInfo>
    {enc_key}
    <EncryptionVersion>E002</EncryptionVersion>
  </EncryptionPubKeyInfo>
  <PartnerID>{partner_id}</PartnerID>
  <UserID>{user_id}</UserID>
</HIARequestOrderData>"#,
        auth_key = rsa_key_value_xml(authentication_public),
        enc_key = rsa_key_value_xml(encryption_public),
    )
    .into_bytes()
}

fn unsecured_request(
    host_id: &str,
    partner_id: &str,
    user_id: &str,
    order_type: &str,
    order_data: &[u8],
) -> ProtocolResult<Vec<u8>> {
    let compressed = zlib_compress(order_data)?;
    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsUnsecuredRequest xmlns="http://www.ebics.org/H004" Version="H004" Revision="1">
  <header authenticate="true">
    <static>
      <HostID>{host_id}</HostID>
      <PartnerID>{partner_id}</PartnerID>
      <UserID>{user_id}</UserID>
      <OrderDetails>
        <OrderType>{order_type}</OrderType>
        <OrderAttribute>DZNHNN</OrderAttribute>
      </OrderDetails>
      <SecurityMedium>0000</SecurityMedium>
    </static>
    <mutable/>
  </header>
  <body>
    <DataTransfer>
      <OrderData>{order_data}</OrderData>
    </DataTransfer>
  </body>
</ebicsUnsecuredRequest>"#,
        order_data = b64_encode(&compressed),
    )
    .into_bytes())
}

/// Submits the subscriber's A006 signature public key via INI.
pub async fn submit_ini(
    transport: &dyn BankTransport,
    url: &str,
    host_id: &str,
    partner_id: &str,
    user_id: &str,
    signature_public: &RsaPublicKey,
) -> ProtocolResult<()> {
    let order_data = ini_order_data(signature_public, partner_id, user_id);
    let request = unsecured_request(host_id, partner_id, user_id, "INI", &order_data)?;
    let response = transport.post(url, request).await?;
    let root = gateway_xml::parse(&response)?;
    let (code, text) = parse_return_code(&root)?;
    check_return_code(&code, &text)?;
    Ok(())
}

/// Submits the subscriber's X002 authentication and E002 encryption
/// public keys via HIA.
pub async fn submit_hia(
    transport: &dyn BankTransport,
    url: &str,
    host_id: &str,
    partner_id: &str,
    user_id: &str,
    authentication_public: &RsaPublicKey,
    encryption_public: &RsaPublicKey,
) -> ProtocolResult<()> {
    let order_data = hia_order_data(authentication_public, encryption_public, partner_id, user_id);
    let request = unsecured_request(host_id, partner_id, user_id, "HIA", &order_data)?;
    let response = transport.post(url, request).await?;
    let root = gateway_xml::parse(&response)?;
    let (code, text) = parse_return_code(&root)?;
    check_return_code(&code, &text)?;
    Ok(())
}

/// The bank's public keys learned via HPB.
pub struct BankKeys {
    pub authentication_public: RsaPublicKey,
    pub encryption_public: RsaPublicKey,
}

/// Builds an HPB request. HPB is a download order, so it is authenticated
/// like any other download but carries no upload order data of its own.
pub fn build_hpb_request(host_id: &str, partner_id: &str, user_id: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsNoPubKeyDigestsRequest xmlns="http://www.ebics.org/H004" Version="H004" Revision="1">
  <header authenticate="true">
    <static>
      <HostID>{host_id}</HostID>
      <PartnerID>{partner_id}</PartnerID>
      <UserID>{user_id}</UserID>
      <OrderDetails>
        <OrderType>HPB</OrderType>
        <OrderAttribute>DZHNN</OrderAttribute>
      </OrderDetails>
      <SecurityMedium>0000</SecurityMedium>
    </static>
    <mutable/>
  </header>
  <body/>
</ebicsNoPubKeyDigestsRequest>"#
    )
    .into_bytes()
}

/// Decrypts and parses an HPB response's order data into the bank's
/// authentication and encryption public keys.
///
/// The order data is encrypted the same way E002 order data always is:
/// an AES session key wrapped under the *subscriber's own* E002 public
/// key, so only the subscriber's encryption private key can open it.
pub fn parse_hpb_response(
    response: &[u8],
    encryption_private: &rsa::RsaPrivateKey,
) -> ProtocolResult<BankKeys> {
    let root = gateway_xml::parse(response)?;
    let (code, text) = parse_return_code(&root)?;
    check_return_code(&code, &text)?;

    let body = require_unique_child(&root, "body")?;
    let data_transfer = require_unique_child(body, "DataTransfer")?;
    let data_encryption_info = require_unique_child(data_transfer, "DataEncryptionInfo")?;
    let transaction_key_b64 = require_text_child(data_encryption_info, "TransactionKey")?;
    let encrypted_key = b64_decode(transaction_key_b64)?;

    let order_data_b64 = require_text_child(data_transfer, "OrderData")?;
    let ciphertext = b64_decode(order_data_b64)?;

    let plaintext = gateway_crypto::e002::decrypt_e002(encryption_private, &encrypted_key, &ciphertext)
        .map_err(ProtocolError::from)?;
    let decompressed = zlib_decompress(&plaintext)?;

    let order_data_root = gateway_xml::parse(&decompressed)?;
    let auth_info = require_unique_child(&order_data_root, "AuthenticationPubKeyInfo")?;
    let enc_info = require_unique_child(&order_data_root, "EncryptionPubKeyInfo")?;

    Ok(BankKeys {
        authentication_public: parse_rsa_key_value(auth_info)?,
        encryption_public: parse_rsa_key_value(enc_info)?,
    })
}

fn parse_rsa_key_value(info: &gateway_xml::Element) -> ProtocolResult<RsaPublicKey> {
    let pub_key_value = require_unique_child(info, "PubKeyValue")?;
    let rsa_key_value = require_unique_child(pub_key_value, "RSAKeyValue")?;
    let modulus = b64_decode(require_text_child(rsa_key_value, "Modulus")?)?;
    let exponent = b64_decode(require_text_child(rsa_key_value, "Exponent")?)?;
    let n = rsa::BigUint::from_bytes_be(&modulus);
    let e = rsa::BigUint::from_bytes_be(&exponent);
    RsaPublicKey::new(n, e).map_err(|err| ProtocolError::from(CryptoError::InvalidKeyEncoding(err.to_string())))
}
