//! Wire-level header handling: conditional revalidation request header and
//! the `ETag` / `Expires` response validators.

use std::time::SystemTime;

use http::header::ETAG;
use http::header::EXPIRES;
use http::header::IF_NONE_MATCH;
use http::HeaderMap;
use http::HeaderValue;
use tracing::warn;

use super::AuthProvider;

/// Builds the request header set: auth headers first, then `If-None-Match`
/// on top when an etag is held.
pub fn request_headers(
    auth: &dyn AuthProvider,
    etag: Option<&str>,
) -> HeaderMap {
    let mut headers = auth.auth_headers();
    if let Some(etag) = etag {
        match HeaderValue::from_str(etag) {
            Ok(value) => {
                headers.insert(IF_NONE_MATCH, value);
            }
            Err(e) => warn!(etag, "skipping If-None-Match, etag is not a valid header value: {e}"),
        }
    }
    headers
}

/// The response's `ETag`, stored verbatim.
pub fn response_etag(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// The response's `Expires` as an absolute timestamp; absent or unparsable
/// yields `None`.
pub fn response_expires(headers: &HeaderMap) -> Option<SystemTime> {
    headers
        .get(EXPIRES)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| httpdate::parse_http_date(s.trim()).ok())
}
