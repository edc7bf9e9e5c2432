//! RSA key generation and PKCS#8/X.509 (de)serialization.
//!
//! EBICS 2.5 only ever uses 2048-bit RSA keys for A006, E002, and X002 —
//! `generate_rsa` does not take a key-size parameter for that reason.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::CryptoError;

/// The only RSA modulus size EBICS 2.5 (A006/E002/X002) supports.
pub const EBICS_KEY_BITS: usize = 2048;

/// Generates a fresh 2048-bit RSA keypair for use as an A006, E002, or X002 key.
pub fn generate_rsa() -> Result<(RsaPrivateKey, RsaPublicKey), CryptoError> {
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, EBICS_KEY_BITS)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);
    Ok((private, public))
}

/// Encodes a private key as PKCS#8 DER, the format the persistence substrate
/// is expected to store ([`gateway_types::model::connection::PrivateKeyDer`]).
pub fn private_key_to_der(key: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    key.to_pkcs8_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))
}

/// Decodes a PKCS#8 DER-encoded private key, validating it is 2048 bits.
pub fn private_key_from_der(der: &[u8]) -> Result<RsaPrivateKey, CryptoError> {
    let key = RsaPrivateKey::from_pkcs8_der(der)
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
    check_key_size(key.size() * 8)?;
    Ok(key)
}

/// Encodes a public key as X.509 SubjectPublicKeyInfo DER.
pub fn public_key_to_der(key: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    key.to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))
}

/// Decodes an X.509 SubjectPublicKeyInfo DER-encoded public key.
pub fn public_key_from_der(der: &[u8]) -> Result<RsaPublicKey, CryptoError> {
    let key = RsaPublicKey::from_public_key_der(der)
        .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
    check_key_size(key.size() * 8)?;
    Ok(key)
}

fn check_key_size(bits: usize) -> Result<(), CryptoError> {
    if bits != EBICS_KEY_BITS {
        return Err(CryptoError::WrongKeySize {
            expected: EBICS_KEY_BITS,
            actual: bits,
        });
    }
    Ok(())
}
