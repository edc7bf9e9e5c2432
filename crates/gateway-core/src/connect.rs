//! Connection key-exchange orchestration: INI, HIA, and HPB, driven to
//! completion by one `connect` call.
//!
//! `ebics-protocol` only knows how to build and parse one order at a
//! time; this module is what decides *which* order a connection still
//! needs, generating subscriber keys on first use and persisting
//! progress after each step so a retried `connect` call picks up where
//! the last one left off rather than re-submitting an already-accepted
//! order.

use ebics_protocol::keyex;
use ebics_protocol::transport::BankTransport;
use gateway_crypto::rsa_keys::{generate_rsa, private_key_from_der, private_key_to_der, public_key_to_der};
use gateway_types::error::{GatewayError, GatewayResult};
use gateway_types::model::connection::{BankConnection, KeyExchangeState, PrivateKeyDer, PublicKeyDer};
use gateway_types::repository::GatewayStore;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::map_protocol_error;

/// Generates any of the subscriber's three RSA keypairs that the
/// connection does not already have on file. Idempotent: a connection
/// with all three keys is left untouched.
fn ensure_subscriber_keys(connection: &mut BankConnection) -> GatewayResult<()> {
    if connection.keys.signature_private.is_none() {
        let (private, _) = generate_rsa().map_err(crate::error::map_crypto_error)?;
        connection.keys.signature_private =
            Some(PrivateKeyDer(private_key_to_der(&private).map_err(crate::error::map_crypto_error)?));
    }
    if connection.keys.authentication_private.is_none() {
        let (private, _) = generate_rsa().map_err(crate::error::map_crypto_error)?;
        connection.keys.authentication_private =
            Some(PrivateKeyDer(private_key_to_der(&private).map_err(crate::error::map_crypto_error)?));
    }
    if connection.keys.encryption_private.is_none() {
        let (private, _) = generate_rsa().map_err(crate::error::map_crypto_error)?;
        connection.keys.encryption_private =
            Some(PrivateKeyDer(private_key_to_der(&private).map_err(crate::error::map_crypto_error)?));
    }
    Ok(())
}

fn load_private(der: &Option<PrivateKeyDer>, which: &str) -> GatewayResult<RsaPrivateKey> {
    let der = der
        .as_ref()
        .ok_or_else(|| GatewayError::state(format!("{which} private key missing")))?;
    private_key_from_der(&der.0).map_err(crate::error::map_crypto_error)
}

/// Drives a connection's key exchange as far forward as it can go in one
/// call: generates missing keys, submits INI and HIA if not yet sent, and
/// downloads the bank's public keys via HPB once both have been accepted.
///
/// INI always precedes HIA precedes HPB; this function enforces that by
/// checking (and persisting) each step's state before attempting the
/// next. It is safe to call repeatedly — a connection already `ready`
/// returns immediately.
pub async fn connect(
    store: &dyn GatewayStore,
    transport: &dyn BankTransport,
    connection_id: &str,
) -> GatewayResult<()> {
    let mut connection = store.connections().get(connection_id).await?;
    let ebics = connection
        .ebics_config()
        .ok_or_else(|| GatewayError::bad_request("connection is not an EBICS connection"))?
        .clone();

    if connection.is_ready() {
        return Ok(());
    }

    ensure_subscriber_keys(&mut connection)?;
    if connection.ini_state == KeyExchangeState::Unknown {
        connection.ini_state = KeyExchangeState::NotSent;
    }
    if connection.hia_state == KeyExchangeState::Unknown {
        connection.hia_state = KeyExchangeState::NotSent;
    }
    store.connections().upsert(connection.clone()).await?;

    let signature_private = load_private(&connection.keys.signature_private, "signature")?;
    let authentication_private = load_private(&connection.keys.authentication_private, "authentication")?;
    let encryption_private = load_private(&connection.keys.encryption_private, "encryption")?;

    if connection.ini_state != KeyExchangeState::Sent {
        let signature_public = RsaPublicKey::from(&signature_private);
        keyex::submit_ini(
            transport,
            &ebics.base_url,
            &ebics.host_id,
            &ebics.partner_id,
            &ebics.user_id,
            &signature_public,
        )
        .await
        .map_err(map_protocol_error)?;
        connection.ini_state = KeyExchangeState::Sent;
        store.connections().upsert(connection.clone()).await?;
    }

    if connection.hia_state != KeyExchangeState::Sent {
        let authentication_public = RsaPublicKey::from(&authentication_private);
        let encryption_public = RsaPublicKey::from(&encryption_private);
        keyex::submit_hia(
            transport,
            &ebics.base_url,
            &ebics.host_id,
            &ebics.partner_id,
            &ebics.user_id,
            &authentication_public,
            &encryption_public,
        )
        .await
        .map_err(map_protocol_error)?;
        connection.hia_state = KeyExchangeState::Sent;
        store.connections().upsert(connection.clone()).await?;
    }

    if connection.keys.bank_authentication_public.is_none() || connection.keys.bank_encryption_public.is_none() {
        if connection.ini_state != KeyExchangeState::Sent || connection.hia_state != KeyExchangeState::Sent {
            return Err(GatewayError::state(
                "HPB attempted before INI/HIA were both accepted",
            ));
        }
        let request = keyex::build_hpb_request(&ebics.host_id, &ebics.partner_id, &ebics.user_id);
        let response = transport
            .post(&ebics.base_url, request)
            .await
            .map_err(map_protocol_error)?;
        let bank_keys = keyex::parse_hpb_response(&response, &encryption_private).map_err(map_protocol_error)?;

        connection.keys.bank_authentication_public = Some(PublicKeyDer(
            public_key_to_der(&bank_keys.authentication_public).map_err(crate::error::map_crypto_error)?,
        ));
        connection.keys.bank_encryption_public = Some(PublicKeyDer(
            public_key_to_der(&bank_keys.encryption_public).map_err(crate::error::map_crypto_error)?,
        ));
        store.connections().upsert(connection).await?;
    }

    Ok(())
}

/// Probes a bank endpoint's supported EBICS versions.
/// Read-only: performs no state transition on the connection.
pub async fn probe_version(
    store: &dyn GatewayStore,
    transport: &dyn BankTransport,
    connection_id: &str,
) -> GatewayResult<Vec<String>> {
    let connection = store.connections().get(connection_id).await?;
    let ebics = connection
        .ebics_config()
        .ok_or_else(|| GatewayError::bad_request("connection is not an EBICS connection"))?;
    let versions = ebics_protocol::hev::probe_hev(transport, &ebics.base_url, &ebics.host_id)
        .await
        .map_err(map_protocol_error)?;
    Ok(versions.into_iter().map(|v| v.protocol_version).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_protocol::transport::FakeBankTransport;
    use gateway_types::model::connection::{ConnectionConfig, EbicsConnectionConfig};

    fn sample_connection() -> BankConnection {
        BankConnection::new(
            "conn-1",
            ConnectionConfig::Ebics(EbicsConnectionConfig {
                base_url: "https://bank.example/ebics".to_string(),
                host_id: "HOST1".to_string(),
                partner_id: "PARTNER1".to_string(),
                user_id: "USER1".to_string(),
                system_id: None,
            }),
        )
    }

    fn ok_response() -> Vec<u8> {
        br#"<ebicsUnsecuredResponse xmlns="http://www.ebics.org/H004">
          <header><mutable><ReturnCode>000000</ReturnCode><ReportText>[EBICS_OK]</ReportText></mutable></header>
        </ebicsUnsecuredResponse>"#
            .to_vec()
    }

    fn hpb_response(customer_encryption_public: &RsaPublicKey, bank_auth: &RsaPublicKey, bank_enc: &RsaPublicKey) -> Vec<u8> {
        fn key_value_xml(key: &RsaPublicKey) -> String {
            use ebics_protocol::envelope::b64_encode;
            use rsa::traits::PublicKeyParts;
            format!(
                "<PubKeyValue><RSAKeyValue xmlns=\"http://www.w3.org/2000/09/xmldsig#\"><Modulus>{}</Modulus><Exponent>{}</Exponent></RSAKeyValue></PubKeyValue>",
                b64_encode(&key.n().to_bytes_be()),
                b64_encode(&key.e().to_bytes_be()),
            )
        }

        let order_data = format!(
            "<HPBResponseOrderData><AuthenticationPubKeyInfo>{}<AuthenticationVersion>X002</AuthenticationVersion></AuthenticationPubKeyInfo><EncryptionPubKeyInfo>{}<EncryptionVersion>E002</EncryptionVersion></EncryptionPubKeyInfo></HPBResponseOrderData>",
            key_value_xml(bank_auth),
            key_value_xml(bank_enc),
        );
        let compressed = ebics_protocol::envelope::zlib_compress(order_data.as_bytes()).unwrap();
        let envelope = gateway_crypto::e002::encrypt_e002(customer_encryption_public, &compressed).unwrap();
        format!(
            r#"<ebicsResponse xmlns="http://www.ebics.org/H004">
              <header><mutable><ReturnCode>000000</ReturnCode><ReportText>[EBICS_OK]</ReportText></mutable></header>
              <body>
                <DataTransfer>
                  <DataEncryptionInfo><EncryptionPubKeyDigest Version="E002">{digest}</EncryptionPubKeyDigest><TransactionKey>{key}</TransactionKey></DataEncryptionInfo>
                  <OrderData>{data}</OrderData>
                </DataTransfer>
              </body>
            </ebicsResponse>"#,
            digest = ebics_protocol::envelope::b64_encode(&envelope.recipient_key_digest),
            key = ebics_protocol::envelope::b64_encode(&envelope.encrypted_key),
            data = ebics_protocol::envelope::b64_encode(&envelope.ciphertext),
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn hpb_happy_path_leaves_connection_ready_with_bank_keys() {
        let store = crate::store::InMemoryStore::default();
        store.connections().upsert(sample_connection()).await.unwrap();

        // First call only generates keys and submits INI/HIA.
        let transport = FakeBankTransport::new(vec![ok_response(), ok_response()]);
        connect(&store, &transport, "conn-1").await.unwrap();

        let connection = store.connections().get("conn-1").await.unwrap();
        assert_eq!(connection.ini_state, KeyExchangeState::Sent);
        assert_eq!(connection.hia_state, KeyExchangeState::Sent);
        assert!(!connection.is_ready());

        let customer_encryption_private =
            private_key_from_der(&connection.keys.encryption_private.clone().unwrap().0).unwrap();
        let customer_encryption_public = RsaPublicKey::from(&customer_encryption_private);
        let (_, bank_auth_public) = generate_rsa().unwrap();
        let (_, bank_enc_public) = generate_rsa().unwrap();

        let transport = FakeBankTransport::new(vec![hpb_response(
            &customer_encryption_public,
            &bank_auth_public,
            &bank_enc_public,
        )]);
        connect(&store, &transport, "conn-1").await.unwrap();

        let connection = store.connections().get("conn-1").await.unwrap();
        assert!(connection.is_ready());
        let got_auth = public_key_from_der_helper(&connection.keys.bank_authentication_public.unwrap().0);
        let got_enc = public_key_from_der_helper(&connection.keys.bank_encryption_public.unwrap().0);
        assert_eq!(got_auth, bank_auth_public);
        assert_eq!(got_enc, bank_enc_public);
    }

    fn public_key_from_der_helper(der: &[u8]) -> RsaPublicKey {
        gateway_crypto::rsa_keys::public_key_from_der(der).unwrap()
    }
}
