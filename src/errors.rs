//! Freshness Cache Error Hierarchy
//!
//! Defines the error types surfaced by the cache engine, categorized by
//! where the failure originated: configuration, the transport capability,
//! or the endpoint's own response handling.

use std::time::Duration;

use config::ConfigError;
use http::HeaderMap;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failures of a single `fetch()` invocation
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl Error {
    /// Returns the fetch failure, if this error is one.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            Error::Fetch(e) => Some(e),
            Error::Config(_) => None,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// No URL configured at fetch time
    #[error("No URL configured for endpoint")]
    MissingUrl,

    /// Any status other than 200 / 304
    #[error("Unexpected response status {status}")]
    UnexpectedResponse { status: u16, headers: HeaderMap },

    /// Caller-supplied converter rejected a 200 body
    #[error("Payload conversion failed: {0}")]
    Convert(String),

    /// The request never produced an HTTP response
    #[error(transparent)]
    Transport(TransportError),
}

impl FetchError {
    /// A 304 delivered as a failure rather than as a response.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, FetchError::UnexpectedResponse { status: 304, .. })
    }

    /// Whether this failure ends the change stream when it happens while the
    /// endpoint is observed. Transport failures and a missing URL never do.
    pub fn is_terminal(&self) -> bool {
        match self {
            FetchError::UnexpectedResponse { .. } => !self.is_not_modified(),
            FetchError::Convert(_) => true,
            FetchError::MissingUrl | FetchError::Transport(_) => false,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        match e {
            // Transports report non-200/304 statuses as failures; fold them into
            // the same variant a direct non-200/304 response produces.
            TransportError::Status { status, headers } => FetchError::UnexpectedResponse { status, headers },
            other => FetchError::Transport(other),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a status the transport treats as failure
    #[error("HTTP status {status}")]
    Status { status: u16, headers: HeaderMap },

    /// Connection-level failure (DNS, refused, reset...)
    #[error("Network failure: {0}")]
    Network(String),

    /// Request did not complete in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body could not be decoded as JSON
    #[error("Failed to decode response body: {0}")]
    Decode(String),
}
