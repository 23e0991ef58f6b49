//! Wire transport seam.
//!
//! The channel's interceptor pipeline is transport-agnostic; production
//! uses JSON over HTTP, tests inject fault-scripted fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::proto::ErrorBody;
use crate::status::{Code, RpcError};

/// One physical request/response exchange with the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `method` (a path like `"v1/auth/login"`) and return
    /// the decoded response payload.
    async fn send(&self, method: &str, body: &Value) -> Result<Value, RpcError>;
}

/// JSON-over-HTTP transport (reqwest).
///
/// Errors are decoded from the server's error envelope when present;
/// connection-level failures map to `Unavailable`.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(cfg: &ClientConfig) -> Result<Self, RpcError> {
        let scheme = if cfg.insecure { "http" } else { "https" };

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RpcError::new(Code::Internal, format!("failed to build client: {e}")))?;

        Ok(Self {
            http,
            base_url: format!("{scheme}://{}", cfg.address),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: &str, body: &Value) -> Result<Value, RpcError> {
        let url = format!("{}/{method}", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::new(Code::Unavailable, e.to_string()))?;

        if response.status().is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| RpcError::new(Code::Internal, format!("malformed response: {e}")));
        }

        // Prefer the structured envelope; fall back to the HTTP status line.
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(envelope) => Err(RpcError::new(envelope.code, envelope.message)),
            Err(_) => Err(RpcError::new(
                if status.is_server_error() {
                    Code::Internal
                } else {
                    Code::Unavailable
                },
                format!("http status {status}"),
            )),
        }
    }
}
