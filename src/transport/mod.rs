//! Transport and auth capabilities consumed by the cache engine.
//!
//! The engine never talks to the network directly: it asks an
//! [`HttpTransport`] to perform a GET with a prepared header set and reads
//! back `{status, headers, body}`. Request headers start from the
//! [`AuthProvider`]'s set; `If-None-Match` is layered on top when a
//! validator is held.

mod auth;
mod headers;
#[cfg(feature = "reqwest")]
mod reqwest_transport;

pub use auth::*;
pub use headers::*;
#[cfg(feature = "reqwest")]
pub use reqwest_transport::*;


use async_trait::async_trait;
use http::HeaderMap;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::TransportError;

/// Raw response handed back by a transport.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Decoded JSON body; `None` for 304 and for empty 200 bodies
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    pub fn not_modified() -> Self {
        Self::new(304)
    }

    /// Builder-style header insertion; invalid names or values are ignored.
    pub fn with_header(
        mut self,
        name: &str,
        value: &str,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Case-insensitive header lookup
    pub fn header(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// Performs `GET url` with the given headers.
    ///
    /// # Returns
    /// - `Ok(HttpResponse)` for 200 and 304. Implementations may also return
    ///   other statuses as responses; the engine treats them as unexpected.
    ///
    /// # Errors
    /// - [`TransportError::Status`] when the transport itself classifies the
    ///   status as a failure (carrying status and headers)
    /// - [`TransportError::Network`] / [`TransportError::Timeout`] when no
    ///   response was received
    /// - [`TransportError::Decode`] when a body was not valid JSON
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> std::result::Result<HttpResponse, TransportError>;
}
