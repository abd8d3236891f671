use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use tracing::trace;

use super::HttpResponse;
use super::HttpTransport;
use crate::TransportError;

/// Production transport backed by `reqwest`.
///
/// 200 bodies are decoded as JSON (an empty body decodes to `None`), 304 is
/// returned as a bodiless response and every other status is reported as
/// [`TransportError::Status`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> std::result::Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    /// Wraps an already configured client.
    pub fn with_client(
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        Self { client, timeout }
    }

    fn map_error(
        &self,
        e: reqwest::Error,
    ) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        trace!(url, status, "response received");

        match status {
            304 => Ok(HttpResponse {
                status,
                headers,
                body: None,
            }),
            200 => {
                let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
                let body = if bytes.iter().all(u8::is_ascii_whitespace) {
                    None
                } else {
                    Some(serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))?)
                };
                Ok(HttpResponse { status, headers, body })
            }
            _ => Err(TransportError::Status { status, headers }),
        }
    }
}
