//! Crypto error taxonomy.

/// Errors from crypto primitives. Authentication failures (bad signature,
/// bad ciphertext/MAC) are non-retryable.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("wrong key size: expected {expected} bits, got {actual} bits")]
    WrongKeySize { expected: usize, actual: usize },
}
