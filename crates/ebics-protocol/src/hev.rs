//! HEV: the unauthenticated version probe every EBICS session can start
//! with to discover which EBICS/H0xx revisions a bank endpoint supports.

use gateway_xml::combinators::map_each_child;

use crate::error::ProtocolResult;
use crate::transport::BankTransport;

/// Builds an `ebicsHEVRequest` body.
pub fn build_hev_request(host_id: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsHEVRequest xmlns="http://www.ebics.org/H000">
  <HostID>{host_id}</HostID>
</ebicsHEVRequest>"#
    )
    .into_bytes()
}

/// A single supported protocol/version pair from an HEV response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersion {
    pub protocol_version: String,
    pub order_id: Option<String>,
}

/// Parses an `ebicsHEVResponse` body into the list of versions a bank
/// endpoint advertises.
pub fn parse_hev_response(bytes: &[u8]) -> ProtocolResult<Vec<SupportedVersion>> {
    let root = gateway_xml::parse(bytes)?;
    map_each_child(&root, "VersionNumber", |el| {
        Ok(SupportedVersion {
            protocol_version: el.text_trimmed().to_string(),
            order_id: el.attr("ProtocolVersion").map(str::to_string),
        })
    })
    .map_err(Into::into)
}

/// Probes a bank's EBICS endpoint for its supported protocol versions.
pub async fn probe_hev(
    transport: &dyn BankTransport,
    url: &str,
    host_id: &str,
) -> ProtocolResult<Vec<SupportedVersion>> {
    let request = build_hev_request(host_id);
    let response = transport.post(url, request).await?;
    parse_hev_response(&response)
}
