//! The JSON shape of a subscriber key backup file.
//!
//! A backup file lets an operator archive (and later restore) the three
//! RSA private keys a bank connection owns, independent of whatever the
//! persistence substrate does. [`BackupFile`] is a pure data type; the
//! password-based encryption that produces and consumes `*_blob` is
//! [`gateway_crypto::backup`]'s concern, wired together by
//! `gateway-core`'s backup export/import functions.

use serde::{Deserialize, Serialize};

/// A password-protected export of one EBICS connection's subscriber keys.
///
/// Field names and casing match the wire format exactly
/// (`userID`/`hostID`/`partnerID`/`ebicsURL`), since this file is meant to
/// be handed between operators and tools rather than only read back by
/// this gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFile {
    #[serde(rename = "type")]
    pub connection_type: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "hostID")]
    pub host_id: String,
    #[serde(rename = "partnerID")]
    pub partner_id: String,
    #[serde(rename = "ebicsURL")]
    pub ebics_url: String,
    /// Base64 of a password-encrypted PKCS#8 X002 authentication key.
    pub auth_blob: String,
    /// Base64 of a password-encrypted PKCS#8 E002 encryption key.
    pub enc_blob: String,
    /// Base64 of a password-encrypted PKCS#8 A006 signature key.
    pub sig_blob: String,
}

impl BackupFile {
    pub const CONNECTION_TYPE: &'static str = "ebics";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let backup = BackupFile {
            connection_type: BackupFile::CONNECTION_TYPE.to_string(),
            user_id: "USER1".to_string(),
            host_id: "HOST1".to_string(),
            partner_id: "PARTNER1".to_string(),
            ebics_url: "https://bank.example/ebics".to_string(),
            auth_blob: "YXV0aA==".to_string(),
            enc_blob: "ZW5j".to_string(),
            sig_blob: "c2ln".to_string(),
        };
        let json = serde_json::to_value(&backup).unwrap();
        assert_eq!(json["type"], "ebics");
        assert_eq!(json["userID"], "USER1");
        assert_eq!(json["hostID"], "HOST1");
        assert_eq!(json["partnerID"], "PARTNER1");
        assert_eq!(json["ebicsURL"], "https://bank.example/ebics");
        assert_eq!(json["authBlob"], "YXV0aA==");
    }

    #[test]
    fn round_trips_through_json() {
        let original = BackupFile {
            connection_type: BackupFile::CONNECTION_TYPE.to_string(),
            user_id: "USER1".to_string(),
            host_id: "HOST1".to_string(),
            partner_id: "PARTNER1".to_string(),
            ebics_url: "https://bank.example/ebics".to_string(),
            auth_blob: "YXV0aA==".to_string(),
            enc_blob: "ZW5j".to_string(),
            sig_blob: "c2ln".to_string(),
        };
        let json = serde_json::to_string(&original).unwrap();
        let recovered: BackupFile = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.user_id, original.user_id);
        assert_eq!(recovered.auth_blob, original.auth_blob);
    }
}
