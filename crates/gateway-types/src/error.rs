//! Canonical error shape for the bank connectivity gateway.
//!
//! The upstream design carried two incompatible ad-hoc error declarations;
//! this crate settles on one [`GatewayError`] enum everywhere, so HTTP
//! boundary translation (out of scope here) has exactly one shape to
//! render rather than several to reconcile.

use std::fmt;

/// The taxonomy of errors a gateway operation can fail with.
///
/// Every variant maps to exactly one [`ErrorKind`] via [`GatewayError::kind`],
/// which downstream crates (and an eventual HTTP layer) use to pick a
/// status code without matching on error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-supplied data is invalid (bad IBAN, missing field, ...).
    BadRequest,
    /// A referenced entity (connection, account, payment) does not exist.
    NotFound,
    /// The bank returned a non-OK EBICS return code.
    ProtocolError,
    /// A cryptographic operation failed (bad key, bad signature, bad MAC).
    CryptoError,
    /// Malformed XML, unexpected root element, or unknown enum value.
    ParseError,
    /// The requested operation is illegal in the connection's current state.
    StateError,
    /// A transport-level failure (TCP/HTTP), considered retryable.
    TransportError,
}

impl ErrorKind {
    /// The conventional HTTP status code for this error kind.
    ///
    /// This is advisory: the JSON HTTP surface itself is out of scope, but
    /// every error still carries a status code for whoever does wire it up.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::StateError => 409,
            ErrorKind::ProtocolError => 502,
            ErrorKind::TransportError => 503,
            ErrorKind::CryptoError | ErrorKind::ParseError => 422,
        }
    }
}

/// A gateway-wide error, carrying an [`ErrorKind`], a human-readable reason,
/// and — for protocol failures — the EBICS business return code.
#[derive(Debug, Clone, thiserror::Error)]
pub struct GatewayError {
    kind: ErrorKind,
    reason: String,
    ebics_business_code: Option<String>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            ebics_business_code: None,
        }
    }

    pub fn protocol(reason: impl Into<String>, ebics_business_code: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ProtocolError,
            reason: reason.into(),
            ebics_business_code: Some(ebics_business_code.into()),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, reason)
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, reason)
    }

    pub fn state(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::StateError, reason)
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportError, reason)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn ebics_business_code(&self) -> Option<&str> {
        self.ebics_business_code.as_deref()
    }

    /// Whether a scheduler tick should retry this failure later.
    ///
    /// Transport errors and transient (06xxxx) protocol errors are
    /// retryable; everything else terminates the attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::TransportError)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ebics_business_code {
            Some(code) => write!(f, "{:?}: {} (ebics code {})", self.kind, self.reason, code),
            None => write!(f, "{:?}: {}", self.kind, self.reason),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
