//! Export and import of a [`BackupFile`] for one connection's subscriber keys.
//!
//! A backup carries only the subscriber's own three private keys — the
//! bank's public keys learned via HPB are not exported, since they are
//! re-learned the next time [`crate::connect`] runs and carrying stale
//! copies forward risks masking a bank-side key rotation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use gateway_crypto::backup::{unwrap_private_key, wrap_private_key};
use gateway_crypto::rsa_keys::{private_key_from_der, private_key_to_der};
use gateway_types::model::{BackupFile, BankConnection, PrivateKeyDer, SubscriberKeys};

use crate::error::map_crypto_error;

/// Encrypts `connection`'s three subscriber private keys under `password`
/// and assembles the result into a [`BackupFile`].
///
/// Fails if the connection is missing any of the three keys — a partially
/// provisioned connection (keys generated but INI/HIA not yet sent) has
/// nothing meaningful to restore.
pub fn export_backup(
    connection: &BankConnection,
    password: &str,
) -> Result<BackupFile, gateway_types::error::GatewayError> {
    let config = connection.ebics_config().ok_or_else(|| {
        gateway_types::error::GatewayError::bad_request(
            "backup export only supports EBICS connections",
        )
    })?;

    let sig_der = require_key(&connection.keys.signature_private, "signature")?;
    let auth_der = require_key(&connection.keys.authentication_private, "authentication")?;
    let enc_der = require_key(&connection.keys.encryption_private, "encryption")?;

    let sig_blob = wrap_and_encode(sig_der, password)?;
    let auth_blob = wrap_and_encode(auth_der, password)?;
    let enc_blob = wrap_and_encode(enc_der, password)?;

    Ok(BackupFile {
        connection_type: BackupFile::CONNECTION_TYPE.to_string(),
        user_id: config.user_id.clone(),
        host_id: config.host_id.clone(),
        partner_id: config.partner_id.clone(),
        ebics_url: config.base_url.clone(),
        auth_blob,
        enc_blob,
        sig_blob,
    })
}

/// Decrypts a [`BackupFile`]'s three key blobs under `password`, returning
/// the recovered [`SubscriberKeys`] (bank public keys left unset — the
/// caller still has to run [`crate::connect`] to re-learn them via HPB).
pub fn import_backup(
    backup: &BackupFile,
    password: &str,
) -> Result<SubscriberKeys, gateway_types::error::GatewayError> {
    if backup.connection_type != BackupFile::CONNECTION_TYPE {
        return Err(gateway_types::error::GatewayError::bad_request(format!(
            "unsupported backup file type `{}`",
            backup.connection_type
        )));
    }

    let signature_private = decode_and_unwrap(&backup.sig_blob, password)?;
    let authentication_private = decode_and_unwrap(&backup.auth_blob, password)?;
    let encryption_private = decode_and_unwrap(&backup.enc_blob, password)?;

    Ok(SubscriberKeys {
        signature_private: Some(signature_private),
        authentication_private: Some(authentication_private),
        encryption_private: Some(encryption_private),
        bank_authentication_public: None,
        bank_encryption_public: None,
    })
}

fn require_key<'a>(
    key: &'a Option<PrivateKeyDer>,
    name: &'static str,
) -> Result<&'a PrivateKeyDer, gateway_types::error::GatewayError> {
    key.as_ref().ok_or_else(|| {
        gateway_types::error::GatewayError::state(format!(
            "connection has no {name} private key to export"
        ))
    })
}

fn wrap_and_encode(
    key_der: &PrivateKeyDer,
    password: &str,
) -> Result<String, gateway_types::error::GatewayError> {
    let private_key = private_key_from_der(&key_der.0).map_err(map_crypto_error)?;
    let wrapped = wrap_private_key(&private_key, password).map_err(map_crypto_error)?;
    Ok(BASE64.encode(wrapped))
}

fn decode_and_unwrap(
    blob: &str,
    password: &str,
) -> Result<PrivateKeyDer, gateway_types::error::GatewayError> {
    let encrypted_der = BASE64
        .decode(blob)
        .map_err(|e| gateway_types::error::GatewayError::bad_request(e.to_string()))?;
    let private_key = unwrap_private_key(&encrypted_der, password).map_err(map_crypto_error)?;
    let der = private_key_to_der(&private_key).map_err(map_crypto_error)?;
    Ok(PrivateKeyDer(der))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_crypto::rsa_keys::{generate_rsa, private_key_to_der};
    use gateway_types::model::{ConnectionConfig, EbicsConnectionConfig, PublicKeyDer};

    fn sample_connection() -> BankConnection {
        let mut conn = BankConnection::new(
            "conn-1",
            ConnectionConfig::Ebics(EbicsConnectionConfig {
                base_url: "https://bank.example/ebics".to_string(),
                host_id: "HOST1".to_string(),
                partner_id: "PARTNER1".to_string(),
                user_id: "USER1".to_string(),
                system_id: None,
            }),
        );
        let (sig_priv, _) = generate_rsa().unwrap();
        let (auth_priv, _) = generate_rsa().unwrap();
        let (enc_priv, _) = generate_rsa().unwrap();
        conn.keys.signature_private = Some(PrivateKeyDer(private_key_to_der(&sig_priv).unwrap()));
        conn.keys.authentication_private =
            Some(PrivateKeyDer(private_key_to_der(&auth_priv).unwrap()));
        conn.keys.encryption_private = Some(PrivateKeyDer(private_key_to_der(&enc_priv).unwrap()));
        conn.keys.bank_authentication_public = Some(PublicKeyDer(vec![1, 2, 3]));
        conn
    }

    #[test]
    fn export_then_import_recovers_the_subscriber_keys() {
        let conn = sample_connection();
        let backup = export_backup(&conn, "hunter2").unwrap();

        assert_eq!(backup.connection_type, "ebics");
        assert_eq!(backup.user_id, "USER1");
        assert_eq!(backup.host_id, "HOST1");
        assert_eq!(backup.partner_id, "PARTNER1");
        assert_eq!(backup.ebics_url, "https://bank.example/ebics");

        let recovered = import_backup(&backup, "hunter2").unwrap();
        assert_eq!(
            recovered.signature_private.unwrap().0,
            conn.keys.signature_private.unwrap().0
        );
        assert_eq!(
            recovered.authentication_private.unwrap().0,
            conn.keys.authentication_private.unwrap().0
        );
        assert_eq!(
            recovered.encryption_private.unwrap().0,
            conn.keys.encryption_private.unwrap().0
        );
        // bank public keys are never exported, so import leaves them unset.
        assert!(recovered.bank_authentication_public.is_none());
    }

    #[test]
    fn import_fails_with_wrong_password() {
        let conn = sample_connection();
        let backup = export_backup(&conn, "hunter2").unwrap();
        assert!(import_backup(&backup, "wrong password").is_err());
    }

    #[test]
    fn export_fails_when_a_subscriber_key_is_missing() {
        let mut conn = sample_connection();
        conn.keys.encryption_private = None;
        let err = export_backup(&conn, "hunter2").unwrap_err();
        assert_eq!(err.kind(), gateway_types::error::ErrorKind::StateError);
    }
}
