//! A006: RSASSA-PSS with SHA-256, MGF1-SHA256, a 32-byte salt, and trailer
//! field `0xBC`. This is the signature profile EBICS uses for the order
//! data digest embedded in every signed request.

use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Bytes stripped from order data before it is digested for A006 signing —
/// EBICS strips CR, LF, and SUB (0x0D, 0x0A, 0x1A) before hashing so the
/// digest is stable across transports that normalize line endings.
const STRIPPED_BYTES: [u8; 3] = [0x0D, 0x0A, 0x1A];

/// Computes the A006 order data digest: SHA-256 of `order_data` with every
/// `0x0D`, `0x0A`, and `0x1A` byte removed first.
///
/// This canonicalization is mandatory; it must match byte-for-byte what the
/// bank computes on its side, or every signed request will be rejected.
pub fn digest_order_a006(order_data: &[u8]) -> [u8; 32] {
    let filtered: Vec<u8> = order_data
        .iter()
        .copied()
        .filter(|b| !STRIPPED_BYTES.contains(b))
        .collect();
    Sha256::digest(&filtered).into()
}

/// Signs an order data digest with A006 (RSA-PSS, SHA-256, salt length 32).
pub fn sign_a006(key: &RsaPrivateKey, digest: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    let signing_key = SigningKey::<Sha256>::new(key.clone());
    let mut rng = rand::thread_rng();
    let signature = signing_key
        .try_sign_with_rng(&mut rng, digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    Ok(signature.to_vec())
}

/// Verifies an A006 signature over an order data digest.
pub fn verify_a006(
    key: &RsaPublicKey,
    digest: &[u8; 32],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let verifying_key = VerifyingKey::<Sha256>::new(key.clone());
    let signature =
        Signature::try_from(signature).map_err(|_| CryptoError::VerificationFailed)?;
    verifying_key
        .verify(digest, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}
