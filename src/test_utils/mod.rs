//! Shared test components for the unit tests.
mod scripted;

pub use scripted::*;

use serde_json::json;
use serde_json::Value;

use crate::HttpResponse;

/// `200` with `ETag` and JSON body
pub fn ok_with_etag(
    etag: &str,
    body: Value,
) -> HttpResponse {
    HttpResponse::ok(body).with_header("etag", etag)
}

/// `304` carrying `ETag`
pub fn not_modified_with_etag(etag: &str) -> HttpResponse {
    HttpResponse::not_modified().with_header("etag", etag)
}

pub fn collection(
    etag: &str,
    items: Value,
) -> Value {
    json!({ "etag": etag, "items": items })
}
