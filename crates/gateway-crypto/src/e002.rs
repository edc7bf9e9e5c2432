//! E002: hybrid encryption for order data. A random 128-bit AES key
//! encrypts the (already zlib-compressed) order data under CBC with an
//! all-zero IV; the AES key itself is wrapped for the bank under
//! RSA-PKCS#1 v1.5 with the bank's E002 public key.
//!
//! EBICS mandates the all-zero IV — unlike most CBC usage, the transport
//! key is never reused across messages, so IV reuse does not leak
//! plaintext relationships between them.

use aes::Aes128;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};
use rand::RngCore;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use crate::error::CryptoError;
use crate::fingerprint::ebics_key_fingerprint;

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes128CbcDec = Decryptor<Aes128>;

const AES_KEY_LEN: usize = 16;
const ZERO_IV: [u8; 16] = [0u8; 16];

/// Result of an E002 encryption: the transport-key-wrapped AES key, the
/// [`ebics_key_fingerprint`] of the public key it was wrapped under (so the
/// recipient can tell which of its keys to unwrap with), and the AES-CBC
/// ciphertext.
pub struct E002Envelope {
    pub encrypted_key: Vec<u8>,
    pub recipient_key_digest: [u8; 32],
    pub ciphertext: Vec<u8>,
}

/// Encrypts `plaintext` (typically already zlib-compressed order data)
/// under a freshly generated AES-128 key, and wraps that key under the
/// bank's E002 public key.
pub fn encrypt_e002(
    bank_public_key: &RsaPublicKey,
    plaintext: &[u8],
) -> Result<E002Envelope, CryptoError> {
    let mut rng = rand::thread_rng();
    let mut aes_key = [0u8; AES_KEY_LEN];
    rng.fill_bytes(&mut aes_key);

    let ciphertext = Aes128CbcEnc::new(&aes_key.into(), &ZERO_IV.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let encrypted_key = bank_public_key
        .encrypt(&mut rng, Pkcs1v15Encrypt, &aes_key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(E002Envelope {
        encrypted_key,
        recipient_key_digest: ebics_key_fingerprint(bank_public_key),
        ciphertext,
    })
}

/// Unwraps the AES key with the customer's E002 private key and decrypts
/// the order data ciphertext.
pub fn decrypt_e002(
    private_key: &RsaPrivateKey,
    encrypted_key: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let aes_key = private_key
        .decrypt(Pkcs1v15Encrypt, encrypted_key)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
    if aes_key.len() != AES_KEY_LEN {
        return Err(CryptoError::DecryptionFailed(format!(
            "unwrapped transport key has wrong length: {}",
            aes_key.len()
        )));
    }
    let mut key = [0u8; AES_KEY_LEN];
    key.copy_from_slice(&aes_key);

    Aes128CbcDec::new(&key.into(), &ZERO_IV.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
