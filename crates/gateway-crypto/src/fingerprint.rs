//! EBICS public key fingerprints (Bank Key Verification / HPB letters).
//!
//! The fingerprint is the hash banks and customers read aloud to each other
//! over the phone when a new INI/HIA key is exchanged, so the encoding rule
//! is fixed by the EBICS spec and must match byte-for-byte. Any deviation
//! (leading zero byte, different digest, wrong separator) breaks HPB
//! verification against a bank's published letter.

use rsa::RsaPublicKey;
use rsa::traits::PublicKeyParts;
use sha2::{Digest, Sha256};

/// Computes the EBICS key fingerprint of an RSA public key:
/// SHA-256 of `"<exponent hex> <modulus hex>"`, where exponent and modulus
/// are lowercase hex, big-endian, with no leading zero byte even when the
/// high bit of the leading byte is set.
pub fn ebics_key_fingerprint(key: &RsaPublicKey) -> [u8; 32] {
    let exponent_hex = hex::encode(key.e().to_bytes_be());
    let modulus_hex = hex::encode(key.n().to_bytes_be());
    let mut hasher = Sha256::new();
    hasher.update(exponent_hex.as_bytes());
    hasher.update(b" ");
    hasher.update(modulus_hex.as_bytes());
    hasher.finalize().into()
}

/// Renders a fingerprint as the space-separated hex groups EBICS bank
/// letters print it in (e.g. `"AB12 CD34 ..."`).
pub fn format_fingerprint(fingerprint: &[u8; 32]) -> String {
    hex::encode_upper(fingerprint)
        .as_bytes()
        .chunks(4)
        .map(|c| std::str::from_utf8(c).expect("hex is ascii"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa_keys::generate_rsa;

    #[test]
    fn fingerprint_is_deterministic() {
        let (_, public) = generate_rsa().unwrap();
        let a = ebics_key_fingerprint(&public);
        let b = ebics_key_fingerprint(&public);
        assert_eq!(a, b);
    }

    #[test]
    fn different_keys_yield_different_fingerprints() {
        let (_, public_a) = generate_rsa().unwrap();
        let (_, public_b) = generate_rsa().unwrap();
        assert_ne!(
            ebics_key_fingerprint(&public_a),
            ebics_key_fingerprint(&public_b)
        );
    }

    #[test]
    fn formatted_fingerprint_is_grouped_hex() {
        let (_, public) = generate_rsa().unwrap();
        let fp = ebics_key_fingerprint(&public);
        let rendered = format_fingerprint(&fp);
        assert_eq!(rendered.replace(' ', "").len(), 64);
        assert!(rendered.chars().all(|c| c.is_ascii_hexdigit() || c == ' '));
    }
}
