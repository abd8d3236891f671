use std::time::SystemTime;

use http::HeaderMap;
use tokio::time::Instant;

use crate::response_etag;
use crate::response_expires;

/// Mutable cache state of one endpoint.
pub(crate) struct EndpointState<T> {
    pub(crate) url: Option<String>,
    pub(crate) etag: Option<String>,
    pub(crate) expires_at: Option<SystemTime>,
    pub(crate) last_fetch: Option<Instant>,
    pub(crate) value: Option<T>,
}

impl<T> EndpointState<T> {
    pub(crate) fn new(url: Option<String>) -> Self {
        Self {
            url,
            etag: None,
            expires_at: None,
            last_fetch: None,
            value: None,
        }
    }

    /// Takes the validators from a completed response. Absent headers clear
    /// the previously held ones.
    pub(crate) fn record_validators(
        &mut self,
        headers: &HeaderMap,
        now: Instant,
    ) {
        self.etag = response_etag(headers);
        self.expires_at = response_expires(headers);
        self.last_fetch = Some(now);
    }

    pub(crate) fn clear_validators(&mut self) {
        self.etag = None;
        self.expires_at = None;
        self.last_fetch = None;
    }
}
