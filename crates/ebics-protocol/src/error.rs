//! EBICS protocol errors.

use crate::codes::ReturnCodeClass;

/// Errors from the EBICS protocol engine.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("xml error: {0}")]
    Xml(#[from] gateway_xml::XmlError),
    #[error("crypto error: {0}")]
    Crypto(#[from] gateway_crypto::CryptoError),
    #[error("compression error: {0}")]
    Compression(String),
    #[error("bank returned a fatal return code {code}: {text}")]
    Fatal { code: String, text: String },
    #[error("bank returned a retryable return code {code}: {text}")]
    Retryable { code: String, text: String },
    #[error("unexpected protocol state: {0}")]
    UnexpectedState(String),
    #[error("bank rejected a segment or signature: {0}")]
    Rejected(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Turns a parsed EBICS return code/text pair into `Ok(())` (for
/// [`crate::codes::ReturnCodeClass::Ok`] and
/// [`crate::codes::ReturnCodeClass::NoDataAvailable`]) or the matching
/// [`ProtocolError`] variant.
pub fn check_return_code(code: &str, text: &str) -> ProtocolResult<ReturnCodeClass> {
    match crate::codes::classify(code) {
        ReturnCodeClass::Ok => Ok(ReturnCodeClass::Ok),
        ReturnCodeClass::NoDataAvailable => Ok(ReturnCodeClass::NoDataAvailable),
        ReturnCodeClass::Retryable => Err(ProtocolError::Retryable {
            code: code.to_string(),
            text: text.to_string(),
        }),
        ReturnCodeClass::Fatal => Err(ProtocolError::Fatal {
            code: code.to_string(),
            text: text.to_string(),
        }),
    }
}

impl ProtocolError {
    /// Whether the scheduler should retry this order with backoff rather
    /// than marking the connection in error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProtocolError::Transport(_) | ProtocolError::Retryable { .. }
        )
    }
}
