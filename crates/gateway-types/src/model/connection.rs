//! Bank connection configuration and subscriber key-lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named bank connection: a protocol tag plus its typed parameter bundle.
///
/// Per the Design Notes, the stringly-typed `type` field from the source is
/// replaced with a tagged variant. `Loopback` exists only as a placeholder
/// for a future local testing backend and is never constructed by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum ConnectionConfig {
    Ebics(EbicsConnectionConfig),
    /// Unimplemented stub, kept only so the tagged variant is exhaustive.
    Loopback,
}

/// EBICS-specific connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbicsConnectionConfig {
    pub base_url: String,
    pub host_id: String,
    pub partner_id: String,
    pub user_id: String,
    #[serde(default)]
    pub system_id: Option<String>,
}

/// Progress of a subscriber key-exchange order (INI or HIA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyExchangeState {
    Unknown,
    NotSent,
    Sent,
}

impl Default for KeyExchangeState {
    fn default() -> Self {
        KeyExchangeState::Unknown
    }
}

/// Overall readiness of a bank connection, derived from its INI/HIA/HPB state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Keys not yet generated or submitted.
    NotSent,
    /// INI and/or HIA accepted, waiting for the human operator at the bank
    /// to confirm the subscriber before HPB can succeed.
    Sent,
    /// HPB succeeded: both bank public keys are on file and data exchange
    /// may proceed.
    Ready,
    /// A non-retryable error occurred somewhere in the handshake.
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::NotSent => "not_sent",
            ConnectionStatus::Sent => "sent",
            ConnectionStatus::Ready => "ready",
            ConnectionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A PKCS#8 DER-encoded RSA private key, held opaquely by the data model.
///
/// `gateway-types` never interprets these bytes; `gateway-crypto` does.
/// Keeping the byte wrapper here (rather than re-exporting an `rsa` crate
/// type) avoids a dependency cycle between the model and the crypto crate.
#[derive(Clone, Serialize, Deserialize)]
pub struct PrivateKeyDer(pub Vec<u8>);

impl fmt::Debug for PrivateKeyDer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKeyDer({} bytes, redacted)", self.0.len())
    }
}

/// A PKCS#8/X.509 SubjectPublicKeyInfo DER-encoded RSA public key.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKeyDer(pub Vec<u8>);

impl fmt::Debug for PublicKeyDer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyDer({} bytes)", self.0.len())
    }
}

/// The subscriber's three owned RSA key pairs, plus the bank's public keys
/// learned via HPB.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberKeys {
    pub signature_private: Option<PrivateKeyDer>,
    pub authentication_private: Option<PrivateKeyDer>,
    pub encryption_private: Option<PrivateKeyDer>,
    pub bank_authentication_public: Option<PublicKeyDer>,
    pub bank_encryption_public: Option<PublicKeyDer>,
}

/// A bank connection: identity, protocol configuration, and subscriber
/// key-lifecycle state.
///
/// Ownership: a connection exclusively owns its key material and
/// subscriber state. Bank accounts reference a connection by id; they are
/// never reached by following a pointer stored on the connection (Design
/// Notes §9: one-way owning references plus a lookup index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConnection {
    pub connection_id: String,
    pub config: ConnectionConfig,
    pub keys: SubscriberKeys,
    #[serde(default)]
    pub ini_state: KeyExchangeState,
    #[serde(default)]
    pub hia_state: KeyExchangeState,
}

impl BankConnection {
    pub fn new(connection_id: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            connection_id: connection_id.into(),
            config,
            keys: SubscriberKeys::default(),
            ini_state: KeyExchangeState::Unknown,
            hia_state: KeyExchangeState::Unknown,
        }
    }

    pub fn ebics_config(&self) -> Option<&EbicsConnectionConfig> {
        match &self.config {
            ConnectionConfig::Ebics(config) => Some(config),
            ConnectionConfig::Loopback => None,
        }
    }

    /// Derives the overall [`ConnectionStatus`] from INI/HIA state and
    /// whether both bank public keys have been learned via HPB.
    pub fn status(&self) -> ConnectionStatus {
        let both_bank_keys_known = self.keys.bank_authentication_public.is_some()
            && self.keys.bank_encryption_public.is_some();
        if both_bank_keys_known {
            return ConnectionStatus::Ready;
        }
        match (self.ini_state, self.hia_state) {
            (KeyExchangeState::Sent, KeyExchangeState::Sent) => ConnectionStatus::Sent,
            (KeyExchangeState::Unknown, KeyExchangeState::Unknown) => ConnectionStatus::NotSent,
            _ => ConnectionStatus::NotSent,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == ConnectionStatus::Ready
    }
}
