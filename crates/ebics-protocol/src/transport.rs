//! HTTP transport for EBICS requests.
//!
//! EBICS rides on plain HTTP POST with an XML (or, for some banks,
//! `text/plain`-labeled XML) body and no framing of its own — all state
//! lives inside the XML envelope itself. [`BankTransport`] abstracts just
//! that one POST so the protocol engine can be driven against a fake in
//! tests without a network.

use async_trait::async_trait;

use crate::error::{ProtocolError, ProtocolResult};

/// Posts a raw EBICS XML request body to a bank's EBICS endpoint and
/// returns the raw XML response body.
#[async_trait]
pub trait BankTransport: Send + Sync {
    async fn post(&self, url: &str, body: Vec<u8>) -> ProtocolResult<Vec<u8>>;
}

/// Production [`BankTransport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client configuration is valid");
        Self { client }
    }
}

#[async_trait]
impl BankTransport for ReqwestTransport {
    async fn post(&self, url: &str, body: Vec<u8>) -> ProtocolResult<Vec<u8>> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .body(body)
            .send()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProtocolError::Transport(format!(
                "HTTP {status} from bank endpoint"
            )));
        }
        Ok(bytes.to_vec())
    }
}

/// Test double that replays a scripted sequence of responses, one per
/// call, regardless of the request body. Panics if more calls are made
/// than responses were scripted.
#[cfg(any(test, feature = "test-util"))]
pub struct FakeBankTransport {
    responses: std::sync::Mutex<std::collections::VecDeque<Vec<u8>>>,
    pub requests: std::sync::Mutex<Vec<Vec<u8>>>,
}

#[cfg(any(test, feature = "test-util"))]
impl FakeBankTransport {
    pub fn new(responses: Vec<Vec<u8>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl BankTransport for FakeBankTransport {
    async fn post(&self, _url: &str, body: Vec<u8>) -> ProtocolResult<Vec<u8>> {
        self.requests.lock().unwrap().push(body);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProtocolError::Transport("fake bank transport exhausted".to_string()))
    }
}
