//! Password-protected backup encoding for subscriber private keys.
//!
//! Banks hand customers a recovery procedure built around a
//! password-encrypted PKCS#8 key file; this module produces and consumes
//! that format so a gateway operator can archive and restore subscriber
//! keys independently of whatever the persistence substrate does.

use rsa::RsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};

use crate::error::CryptoError;

/// Encrypts a private key under `password` as a PKCS#8 `EncryptedPrivateKeyInfo` DER document.
pub fn wrap_private_key(key: &RsaPrivateKey, password: &str) -> Result<Vec<u8>, CryptoError> {
    let mut rng = rand::thread_rng();
    let doc = key
        .to_pkcs8_encrypted_der(&mut rng, password.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    Ok(doc.as_bytes().to_vec())
}

/// Decrypts a PKCS#8 `EncryptedPrivateKeyInfo` DER document produced by
/// [`wrap_private_key`].
pub fn unwrap_private_key(der: &[u8], password: &str) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::from_pkcs8_encrypted_der(der, password.as_bytes())
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa_keys::generate_rsa;

    #[test]
    fn wrap_then_unwrap_round_trips() {
        let (private, _) = generate_rsa().unwrap();
        let wrapped = wrap_private_key(&private, "correct horse battery staple").unwrap();
        let recovered = unwrap_private_key(&wrapped, "correct horse battery staple").unwrap();
        assert_eq!(private.to_public_key(), recovered.to_public_key());
    }

    #[test]
    fn unwrap_fails_with_wrong_password() {
        let (private, _) = generate_rsa().unwrap();
        let wrapped = wrap_private_key(&private, "correct horse battery staple").unwrap();
        assert!(unwrap_private_key(&wrapped, "wrong password").is_err());
    }
}
