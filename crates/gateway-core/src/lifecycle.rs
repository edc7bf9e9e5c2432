//! Submission sweep, ingestion sweep, and reconciliation: the per-tick
//! work the scheduler drives for one connection once it is `ready`.

use chrono::{DateTime, Utc};
use ebics_protocol::download::{self, SubscriberIdentity};
use ebics_protocol::transport::BankTransport;
use ebics_protocol::upload::{self, UploadIdentity};
use gateway_crypto::rsa_keys::private_key_from_der;
use gateway_types::error::{GatewayError, GatewayResult};
use gateway_types::model::{BankAccount, RawBankMessage};
use gateway_types::repository::GatewayStore;

use crate::error::{map_iso20022_error, map_protocol_error};

fn bank_keys(
    connection: &gateway_types::model::BankConnection,
) -> GatewayResult<(rsa::RsaPrivateKey, rsa::RsaPublicKey)> {
    let bank_encryption_public = connection
        .keys
        .bank_encryption_public
        .as_ref()
        .ok_or_else(|| GatewayError::state("HPB has not yet been completed"))?;
    let public = gateway_crypto::rsa_keys::public_key_from_der(&bank_encryption_public.0)
        .map_err(crate::error::map_crypto_error)?;
    let encryption_private = connection
        .keys
        .encryption_private
        .as_ref()
        .ok_or_else(|| GatewayError::state("connection has no encryption private key"))?;
    let private = private_key_from_der(&encryption_private.0).map_err(crate::error::map_crypto_error)?;
    Ok((private, public))
}

/// Submits every still-submittable prepared payment for `connection_id`.
/// Returns the number of payments that were accepted by the bank on this
/// sweep. A fatal rejection marks the payment `invalid` and moves on; a
/// retryable (transport) failure leaves it untouched for the next tick.
pub async fn submit_payments(
    store: &dyn GatewayStore,
    transport: &dyn BankTransport,
    connection_id: &str,
) -> GatewayResult<usize> {
    let connection = store.connections().get(connection_id).await?;
    if !connection.is_ready() {
        return Err(GatewayError::state("connection is not ready for submission"));
    }
    let ebics = connection.ebics_config().expect("is_ready implies an ebics connection");

    let signature_private = connection
        .keys
        .signature_private
        .as_ref()
        .ok_or_else(|| GatewayError::state("connection has no signature private key"))?;
    let signature_private = private_key_from_der(&signature_private.0).map_err(crate::error::map_crypto_error)?;
    let authentication_private = connection
        .keys
        .authentication_private
        .as_ref()
        .ok_or_else(|| GatewayError::state("connection has no authentication private key"))?;
    let authentication_private =
        private_key_from_der(&authentication_private.0).map_err(crate::error::map_crypto_error)?;
    let (_, bank_encryption_public) = bank_keys(&connection)?;

    let identity = UploadIdentity {
        host_id: &ebics.host_id,
        partner_id: &ebics.partner_id,
        user_id: &ebics.user_id,
        signature_private: &signature_private,
        authentication_private: &authentication_private,
        bank_encryption_public: &bank_encryption_public,
    };

    let mut submitted_count = 0usize;
    for payment in store.payments().submittable_for_connection(connection_id).await? {
        let debtor = store.accounts().get(&payment.debtor_account_id).await?;
        let pain001_xml = iso20022::render_pain001(&payment, &debtor);

        let mut payment = payment;
        match upload::upload_cct(transport, &ebics.base_url, &identity, pain001_xml.as_bytes()).await {
            Ok(_order_id) => {
                payment.mark_submitted(store.clock().now());
                store.payments().upsert(payment).await?;
                submitted_count += 1;
            }
            Err(err) if err.is_retryable() => {
                tracing::warn!(connection_id, payment_id = %payment.payment_id, error = %err, "transient failure submitting payment, retrying next tick");
            }
            Err(err) => {
                tracing::warn!(connection_id, payment_id = %payment.payment_id, error = %err, "payment rejected, marking invalid");
                payment.mark_invalid(err.to_string());
                store.payments().upsert(payment).await?;
            }
        }
    }
    Ok(submitted_count)
}

/// Downloads and ingests C53 statements for every account of `connection_id`.
///
/// The downloaded order data is treated as a single camt.053 XML document
/// rather than the ZIP archive EBICS allows for multi-account downloads —
/// this gateway requests one account's statement at a time, so the bank
/// never has more than one document to return.
///
/// Returns the number of new (non-duplicate) raw messages ingested.
pub async fn ingest_statements(
    store: &dyn GatewayStore,
    transport: &dyn BankTransport,
    connection_id: &str,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> GatewayResult<usize> {
    let connection = store.connections().get(connection_id).await?;
    if !connection.is_ready() {
        return Err(GatewayError::state("connection is not ready for ingestion"));
    }
    let ebics = connection.ebics_config().expect("is_ready implies an ebics connection");

    let authentication_private = connection
        .keys
        .authentication_private
        .as_ref()
        .ok_or_else(|| GatewayError::state("connection has no authentication private key"))?;
    let authentication_private =
        private_key_from_der(&authentication_private.0).map_err(crate::error::map_crypto_error)?;
    let encryption_private = connection
        .keys
        .encryption_private
        .as_ref()
        .ok_or_else(|| GatewayError::state("connection has no encryption private key"))?;
    let encryption_private = private_key_from_der(&encryption_private.0).map_err(crate::error::map_crypto_error)?;
    let bank_authentication_public = bank_auth_key(&connection)?;

    let identity = SubscriberIdentity {
        host_id: &ebics.host_id,
        partner_id: &ebics.partner_id,
        user_id: &ebics.user_id,
        authentication_private: &authentication_private,
        encryption_private: &encryption_private,
        bank_authentication_public: &bank_authentication_public,
    };

    let mut ingested_count = 0usize;
    for account in store.accounts().list_for_connection(connection_id).await? {
        let epoch = DateTime::from_timestamp(0, 0).expect("unix epoch is always in range");
        let (start, end) = range.unwrap_or((epoch, store.clock().now()));
        let order_data = download::download_order(
            transport,
            &ebics.base_url,
            &identity,
            "C53",
            Some(start),
            Some(end),
        )
        .await
        .map_err(map_protocol_error)?;

        if order_data.is_empty() {
            continue;
        }

        let message_id = iso20022::extract_message_id(&order_data).map_err(map_iso20022_error)?;
        let mut raw_message =
            RawBankMessage::new(connection_id, &message_id, &account.account_id, xml_as_string(&order_data));

        let ingest_result = ingest_one_message(store, &order_data, &account, connection_id).await;
        if let Err(err) = &ingest_result {
            tracing::warn!(connection_id, account_id = %account.account_id, error = %err, "quarantining raw bank message");
            raw_message.quarantine(err.to_string());
        }

        let is_new = store.ledger().insert_raw_message_if_absent(raw_message).await?;
        if !is_new {
            continue;
        }
        ingested_count += 1;

        if ingest_result.is_ok() {
            advance_watermark(store, &account).await?;
        }
    }
    Ok(ingested_count)
}

fn bank_auth_key(connection: &gateway_types::model::BankConnection) -> GatewayResult<rsa::RsaPublicKey> {
    let der = connection
        .keys
        .bank_authentication_public
        .as_ref()
        .ok_or_else(|| GatewayError::state("HPB has not yet been completed"))?;
    gateway_crypto::rsa_keys::public_key_from_der(&der.0).map_err(crate::error::map_crypto_error)
}

fn xml_as_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

async fn ingest_one_message(
    store: &dyn GatewayStore,
    order_data: &[u8],
    account: &BankAccount,
    connection_id: &str,
) -> GatewayResult<()> {
    let transactions = iso20022::parse_camt(order_data, &account.iban).map_err(map_iso20022_error)?;
    for mut transaction in transactions {
        if transaction.direction == gateway_types::model::transaction::Direction::Debit
            && transaction.status == gateway_types::model::transaction::EntryStatus::Book
        {
            if let Some(end_to_end_id) = transaction.end_to_end_id.clone() {
                if let Some(payment) = store
                    .payments()
                    .find_by_end_to_end_id(connection_id, &end_to_end_id)
                    .await?
                {
                    transaction.reconciled_payment_id = Some(payment.payment_id);
                }
            }
        }
        store.ledger().upsert_transaction(transaction).await?;
    }
    Ok(())
}

/// `highest_seen_bank_message_id` is a counter, not the bank's own MsgId —
/// EBICS message ids are bank-assigned strings, not integers, so this
/// tracks ingest progress as an ordinal rather than parsing the bank's id
/// as a number.
async fn advance_watermark(store: &dyn GatewayStore, account: &BankAccount) -> GatewayResult<()> {
    let mut account = account.clone();
    account.highest_seen_bank_message_id += 1;
    store.accounts().upsert(account).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_protocol::envelope::{b64_encode, zlib_compress};
    use ebics_protocol::transport::FakeBankTransport;
    use gateway_crypto::rsa_keys::{generate_rsa, private_key_to_der, public_key_to_der};
    use gateway_types::model::connection::{
        BankConnection, ConnectionConfig, EbicsConnectionConfig, KeyExchangeState, PrivateKeyDer, PublicKeyDer,
    };
    use gateway_types::model::payment::PreparedPayment;
    use rust_decimal::Decimal;

    fn ready_connection(
        signature_private: &rsa::RsaPrivateKey,
        authentication_private: &rsa::RsaPrivateKey,
        encryption_private: &rsa::RsaPrivateKey,
        bank_authentication_public: &rsa::RsaPublicKey,
        bank_encryption_public: &rsa::RsaPublicKey,
    ) -> BankConnection {
        let mut connection = BankConnection::new(
            "conn-1",
            ConnectionConfig::Ebics(EbicsConnectionConfig {
                base_url: "https://bank.example/ebics".to_string(),
                host_id: "HOST1".to_string(),
                partner_id: "PARTNER1".to_string(),
                user_id: "USER1".to_string(),
                system_id: None,
            }),
        );
        connection.ini_state = KeyExchangeState::Sent;
        connection.hia_state = KeyExchangeState::Sent;
        connection.keys.signature_private = Some(PrivateKeyDer(private_key_to_der(signature_private).unwrap()));
        connection.keys.authentication_private =
            Some(PrivateKeyDer(private_key_to_der(authentication_private).unwrap()));
        connection.keys.encryption_private = Some(PrivateKeyDer(private_key_to_der(encryption_private).unwrap()));
        connection.keys.bank_authentication_public =
            Some(PublicKeyDer(public_key_to_der(bank_authentication_public).unwrap()));
        connection.keys.bank_encryption_public = Some(PublicKeyDer(public_key_to_der(bank_encryption_public).unwrap()));
        connection
    }

    #[tokio::test]
    async fn submit_payments_marks_accepted_payment_submitted() {
        let store = crate::store::InMemoryStore::default();
        let (signature_private, _) = generate_rsa().unwrap();
        let (authentication_private, _) = generate_rsa().unwrap();
        let (encryption_private, _) = generate_rsa().unwrap();
        let (_, bank_auth_public) = generate_rsa().unwrap();
        let (_, bank_enc_public) = generate_rsa().unwrap();

        let connection = ready_connection(
            &signature_private,
            &authentication_private,
            &encryption_private,
            &bank_auth_public,
            &bank_enc_public,
        );
        store.connections().upsert(connection).await.unwrap();

        let debtor = BankAccount::new("acc-1", "conn-1", "DE89370400440532013000", "COBADEFFXXX", "Jane Doe");
        store.accounts().upsert(debtor).await.unwrap();

        let payment = PreparedPayment::new(
            "pay-1",
            "conn-1",
            "acc-1",
            "FR1420041010050500013M02606",
            "PSSTFRPPPAR",
            "Creditor",
            Decimal::new(1000, 2),
            "EUR",
            "invoice",
            store.clock().now(),
            "e2e-1",
            "pmtinf-1",
            "msg-1",
        );
        store.payments().upsert(payment).await.unwrap();

        let ok_response = br#"<ebicsResponse xmlns="http://www.ebics.org/H004">
          <header><mutable><ReturnCode>000000</ReturnCode><ReportText>[EBICS_OK]</ReportText></mutable></header>
          <OrderID>ORDER-1</OrderID>
        </ebicsResponse>"#;
        let transport = FakeBankTransport::new(vec![ok_response.to_vec(), ok_response.to_vec()]);

        let submitted = submit_payments(&store, &transport, "conn-1").await.unwrap();
        assert_eq!(submitted, 1);

        let payment = store.payments().get("pay-1").await.unwrap();
        assert!(payment.submitted);
        assert!(payment.submission_timestamp.is_some());
    }

    #[tokio::test]
    async fn ingest_statements_is_idempotent_on_repeated_ingest() {
        let store = crate::store::InMemoryStore::default();
        let (signature_private, _) = generate_rsa().unwrap();
        let (authentication_private, _) = generate_rsa().unwrap();
        let (encryption_private, encryption_public) = generate_rsa().unwrap();
        let (_, bank_auth_public) = generate_rsa().unwrap();
        let (_, bank_enc_public) = generate_rsa().unwrap();

        let connection = ready_connection(
            &signature_private,
            &authentication_private,
            &encryption_private,
            &bank_auth_public,
            &bank_enc_public,
        );
        store.connections().upsert(connection).await.unwrap();

        let account = BankAccount::new("acc-1", "conn-1", "DE89370400440532013000", "COBADEFFXXX", "Jane Doe");
        store.accounts().upsert(account).await.unwrap();

        let camt = br#"<Document><BkToCstmrStmt>
            <GrpHdr><MsgId>STMT-1</MsgId></GrpHdr>
            <Stmt>
                <Acct><Id><IBAN>DE89370400440532013000</IBAN></Id></Acct>
                <Ntry>
                    <Amt Ccy="EUR">1.00</Amt>
                    <CdtDbtInd>CRDT</CdtDbtInd>
                    <Sts>BOOK</Sts>
                    <BookgDt><Dt>2024-01-01</Dt></BookgDt>
                </Ntry>
            </Stmt>
        </BkToCstmrStmt></Document>"#;
        let compressed = zlib_compress(camt).unwrap();
        let envelope = gateway_crypto::e002::encrypt_e002(&encryption_public, &compressed).unwrap();

        let init_response = format!(
            r#"<ebicsResponse xmlns="http://www.ebics.org/H004">
              <header><mutable><ReturnCode>000000</ReturnCode><ReportText>[EBICS_OK]</ReportText></mutable></header>
              <TransactionID>TX-1</TransactionID>
              <body>
                <DataTransfer>
                  <DataEncryptionInfo><EncryptionPubKeyDigest Version="E002">{digest}</EncryptionPubKeyDigest><TransactionKey>{key}</TransactionKey></DataEncryptionInfo>
                  <OrderData>{data}</OrderData>
                </DataTransfer>
              </body>
            </ebicsResponse>"#,
            digest = b64_encode(&envelope.recipient_key_digest),
            key = b64_encode(&envelope.encrypted_key),
            data = b64_encode(&envelope.ciphertext),
        );
        let receipt_response = br#"<ebicsResponse xmlns="http://www.ebics.org/H004">
          <header><mutable><ReturnCode>000000</ReturnCode><ReportText>[EBICS_OK]</ReportText></mutable></header>
        </ebicsResponse>"#;

        let transport = FakeBankTransport::new(vec![
            init_response.into_bytes(),
            receipt_response.to_vec(),
        ]);
        let ingested = ingest_statements(&store, &transport, "conn-1", None).await.unwrap();
        assert_eq!(ingested, 1);

        let transactions = store.ledger().transactions_for_account("DE89370400440532013000").await.unwrap();
        assert_eq!(transactions.len(), 1);

        // A second ingest against the same (already-seen) message id is a no-op.
        let transport = FakeBankTransport::new(vec![init_response_again(&envelope), receipt_response.to_vec()]);
        let ingested_again = ingest_statements(&store, &transport, "conn-1", None).await.unwrap();
        assert_eq!(ingested_again, 0);
        let transactions = store.ledger().transactions_for_account("DE89370400440532013000").await.unwrap();
        assert_eq!(transactions.len(), 1);
    }

    fn init_response_again(envelope: &gateway_crypto::e002::E002Envelope) -> Vec<u8> {
        format!(
            r#"<ebicsResponse xmlns="http://www.ebics.org/H004">
              <header><mutable><ReturnCode>000000</ReturnCode><ReportText>[EBICS_OK]</ReportText></mutable></header>
              <TransactionID>TX-2</TransactionID>
              <body>
                <DataTransfer>
                  <DataEncryptionInfo><EncryptionPubKeyDigest Version="E002">{digest}</EncryptionPubKeyDigest><TransactionKey>{key}</TransactionKey></DataEncryptionInfo>
                  <OrderData>{data}</OrderData>
                </DataTransfer>
              </body>
            </ebicsResponse>"#,
            digest = b64_encode(&envelope.recipient_key_digest),
            key = b64_encode(&envelope.encrypted_key),
            data = b64_encode(&envelope.ciphertext),
        )
        .into_bytes()
    }
}
