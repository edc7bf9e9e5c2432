//! EBICS return code classification.
//!
//! Every EBICS response — technical (transport-level `H004`) and
//! business (order-level) — carries a six-digit return code. `06xxxx`
//! codes are transport-layer and safe to retry; `09xxxx` codes are
//! business-layer and are fatal except for the handful of informational
//! codes below that mean "succeeded, but there is nothing to report."

pub const EBICS_OK: &str = "000000";
pub const EBICS_NO_DOWNLOAD_DATA_AVAILABLE: &str = "090005";
pub const EBICS_ACCOUNT_AUTHORISATION_FAILED: &str = "090003";
pub const EBICS_PROCESSING_ERROR: &str = "091116";
pub const EBICS_AUTHENTICATION_FAILED: &str = "061001";
pub const EBICS_INVALID_REQUEST: &str = "061002";

/// How a caller should react to an EBICS return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCodeClass {
    /// `000000`: the order succeeded.
    Ok,
    /// Not an error at all — e.g. no statement data for the requested
    /// window. Callers should treat this as "zero results," not a failure.
    NoDataAvailable,
    /// `06xxxx`: transport-layer problem. Safe to retry with backoff.
    Retryable,
    /// `09xxxx` (other than the informational codes above): a business
    /// rule was violated. Retrying with the same order data will not help.
    Fatal,
}

/// Classifies a raw EBICS return code.
pub fn classify(code: &str) -> ReturnCodeClass {
    if code == EBICS_OK {
        return ReturnCodeClass::Ok;
    }
    if code == EBICS_NO_DOWNLOAD_DATA_AVAILABLE {
        return ReturnCodeClass::NoDataAvailable;
    }
    if code.starts_with("06") {
        return ReturnCodeClass::Retryable;
    }
    ReturnCodeClass::Fatal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_codes() {
        assert_eq!(classify(EBICS_OK), ReturnCodeClass::Ok);
        assert_eq!(
            classify(EBICS_NO_DOWNLOAD_DATA_AVAILABLE),
            ReturnCodeClass::NoDataAvailable
        );
        assert_eq!(
            classify(EBICS_ACCOUNT_AUTHORISATION_FAILED),
            ReturnCodeClass::Fatal
        );
        assert_eq!(classify(EBICS_AUTHENTICATION_FAILED), ReturnCodeClass::Retryable);
        assert_eq!(classify("099999"), ReturnCodeClass::Fatal);
        assert_eq!(classify("069999"), ReturnCodeClass::Retryable);
    }
}
