#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EBICS cryptographic primitives.
//!
//! Everything here is pure, deterministic, and side-effect free given its
//! inputs (apart from key generation and the random AES key/salt in E002,
//! which take their randomness from the OS CSPRNG). Wire framing,
//! canonicalization, and protocol state live in `gateway-xml` and
//! `ebics-protocol` — this crate only knows about bytes and keys.
//!
//! # Modules
//!
//! - [`a006`] - RSASSA-PSS-SHA256 signing/verification and order digesting
//! - [`e002`] - AES-CBC + RSA-PKCS1v1.5 hybrid encryption
//! - [`fingerprint`] - EBICS public key fingerprints (HPB letters)
//! - [`backup`] - Password-protected PKCS#8 key backup
//! - [`rsa_keys`] - RSA key generation and DER (de)serialization
//! - [`error`] - The [`error::CryptoError`] taxonomy

pub mod a006;
pub mod backup;
pub mod e002;
pub mod error;
pub mod fingerprint;
pub mod rsa_keys;

pub use error::CryptoError;
