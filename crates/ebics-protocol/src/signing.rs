//! Builds the `<AuthSignature>` that accompanies every authenticated
//! request: a `ds:SignedInfo` over the digest of the `authenticate="true"`
//! header, itself digested and signed. See the module-level note in
//! [`crate::download`] on the X002/A006 simplification this reuses.

use gateway_xml::Element;
use gateway_xml::c14n::canonicalize;
use rsa::RsaPrivateKey;

use crate::envelope::b64_encode;
use crate::error::ProtocolResult;

fn element(name: &str, attrs: Vec<(&str, &str)>, text: &str, children: Vec<Element>) -> Element {
    Element {
        name: name.to_string(),
        attrs: attrs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
        text: text.to_string(),
    }
}

fn signed_info_element(header_digest_b64: &str) -> Element {
    element(
        "SignedInfo",
        vec![],
        "",
        vec![
            element(
                "CanonicalizationMethod",
                vec![("Algorithm", "http://www.w3.org/2001/10/xml-exc-c14n#")],
                "",
                vec![],
            ),
            element(
                "SignatureMethod",
                vec![("Algorithm", "http://www.ebics.org/H004#sigA006")],
                "",
                vec![],
            ),
            element(
                "Reference",
                vec![("URI", "#xpointer(//*[@authenticate='true'])")],
                "",
                vec![
                    element(
                        "DigestMethod",
                        vec![("Algorithm", "http://www.w3.org/2001/04/xmlenc#sha256")],
                        "",
                        vec![],
                    ),
                    element("DigestValue", vec![], header_digest_b64, vec![]),
                ],
            ),
        ],
    )
}

/// Builds the `<AuthSignature>` element body (everything between the
/// opening and closing tag) for a request whose `<header
/// authenticate="true">` subtree is `header`.
///
/// The header is canonicalized and digested; that digest is embedded in a
/// `SignedInfo`, which is itself canonicalized, digested, and signed with
/// `signing_key`. The rendered result is the canonical `SignedInfo` XML
/// followed by a sibling `SignatureValue`, matching what was actually
/// signed over.
pub fn build_auth_signature(header: &Element, signing_key: &RsaPrivateKey) -> ProtocolResult<String> {
    let header_canonical = canonicalize(header);
    let header_digest = gateway_crypto::a006::digest_order_a006(&header_canonical);

    let signed_info = signed_info_element(&b64_encode(&header_digest));
    let signed_info_canonical = canonicalize(&signed_info);
    let signed_info_xml =
        String::from_utf8(signed_info_canonical.clone()).expect("c14n output is always valid utf8");

    let signed_info_digest = gateway_crypto::a006::digest_order_a006(&signed_info_canonical);
    let signature = gateway_crypto::a006::sign_a006(signing_key, &signed_info_digest)?;

    Ok(format!(
        "{signed_info_xml}<SignatureValue>{signature}</SignatureValue>",
        signature = b64_encode(&signature),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_crypto::rsa_keys::generate_rsa;

    fn header() -> Element {
        gateway_xml::parse(
            br#"<header authenticate="true"><static><HostID>HOST1</HostID></static><mutable/></header>"#,
        )
        .unwrap()
    }

    #[test]
    fn signature_embeds_a_digest_of_the_header() {
        let (private, _) = generate_rsa().unwrap();
        let rendered = build_auth_signature(&header(), &private).unwrap();
        assert!(rendered.contains("<SignedInfo>"));
        assert!(rendered.contains("<DigestValue>"));
        assert!(rendered.contains("<SignatureValue>"));
    }

    #[test]
    fn different_headers_yield_different_signatures() {
        let (private, _) = generate_rsa().unwrap();
        let other = gateway_xml::parse(
            br#"<header authenticate="true"><static><HostID>HOST2</HostID></static><mutable/></header>"#,
        )
        .unwrap();
        let a = build_auth_signature(&header(), &private).unwrap();
        let b = build_auth_signature(&other, &private).unwrap();
        assert_ne!(a, b);
    }
}
