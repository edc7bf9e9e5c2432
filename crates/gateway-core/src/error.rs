//! Conversions from the lower layers' error types into [`GatewayError`].
//!
//! These can't be `impl From<...> for GatewayError` — `GatewayError` lives
//! in `gateway-types`, which neither `ebics-protocol` nor `iso20022` nor
//! `gateway-crypto` depend on, so the orphan rule blocks it everywhere but
//! in a crate that owns neither the trait nor the type. Plain mapping
//! functions, used at every `gateway-core` call site with `.map_err(...)`,
//! do the same job without fighting the compiler.

use ebics_protocol::ProtocolError;
use gateway_crypto::CryptoError;
use gateway_types::error::{ErrorKind, GatewayError};
use gateway_xml::XmlError;
use iso20022::Iso20022Error;

/// Maps an EBICS protocol failure onto [`GatewayError`].
///
/// `ProtocolError::Retryable` (a `06xxxx` transport-layer return code) is
/// folded into [`ErrorKind::TransportError`] rather than
/// [`ErrorKind::ProtocolError`], so [`GatewayError::is_retryable`] treats
/// it as retryable without `gateway-core` having to special-case the
/// business/technical code split a second time.
pub fn map_protocol_error(err: ProtocolError) -> GatewayError {
    match err {
        ProtocolError::Transport(reason) => GatewayError::transport(reason),
        ProtocolError::Retryable { code, text } => {
            GatewayError::transport(format!("retryable EBICS return code {code}: {text}"))
        }
        ProtocolError::Fatal { code, text } => GatewayError::protocol(text, code),
        ProtocolError::Rejected(reason) => GatewayError::new(ErrorKind::ProtocolError, reason),
        ProtocolError::Xml(e) => map_xml_error(e),
        ProtocolError::Crypto(e) => map_crypto_error(e),
        ProtocolError::Compression(reason) => GatewayError::new(ErrorKind::ParseError, reason),
        ProtocolError::UnexpectedState(reason) => GatewayError::state(reason),
    }
}

pub fn map_iso20022_error(err: Iso20022Error) -> GatewayError {
    match err {
        Iso20022Error::Xml(e) => map_xml_error(e),
        other => GatewayError::new(ErrorKind::ParseError, other.to_string()),
    }
}

pub fn map_crypto_error(err: CryptoError) -> GatewayError {
    GatewayError::new(ErrorKind::CryptoError, err.to_string())
}

pub fn map_xml_error(err: XmlError) -> GatewayError {
    GatewayError::new(ErrorKind::ParseError, err.to_string())
}
