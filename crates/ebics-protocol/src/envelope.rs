//! Shared envelope plumbing: zlib compression, base64 framing, and the
//! small amount of XML boilerplate every EBICS request/response carries
//! regardless of order type.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{ProtocolError, ProtocolResult};

/// Compresses `data` with zlib, as EBICS order data always is before
/// being base64-framed into an `OrderData` element.
pub fn zlib_compress(data: &[u8]) -> ProtocolResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ProtocolError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ProtocolError::Compression(e.to_string()))
}

/// Decompresses a zlib stream.
pub fn zlib_decompress(data: &[u8]) -> ProtocolResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ProtocolError::Compression(e.to_string()))?;
    Ok(out)
}

/// Base64-encodes bytes for embedding inside an `OrderData`/`PubKeyValue` element.
pub fn b64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decodes a base64 element body.
pub fn b64_decode(data: &str) -> ProtocolResult<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| ProtocolError::Xml(gateway_xml::XmlError::Malformed(e.to_string())))
}

/// Extracts the `ReturnCode` and `ReportText` from a technical
/// (`header/mutable`) or business-level EBICS response body.
pub fn parse_return_code(root: &gateway_xml::Element) -> ProtocolResult<(String, String)> {
    use gateway_xml::combinators::{maybe_text_child, require_unique_child};

    let body = maybe_text_child(root, "ReturnCode")?;
    if let Some(code) = body {
        let text = maybe_text_child(root, "ReportText")?.unwrap_or_default();
        return Ok((code.to_string(), text.to_string()));
    }

    let header = require_unique_child(root, "header")?;
    let mutable = require_unique_child(header, "mutable")?;
    let code = maybe_text_child(mutable, "ReturnCode")?
        .ok_or_else(|| ProtocolError::UnexpectedState("response has no ReturnCode".into()))?;
    let text = maybe_text_child(mutable, "ReportText")?.unwrap_or_default();
    Ok((code.to_string(), text.to_string()))
}
