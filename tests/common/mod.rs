use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use freshet::Collection;
use freshet::CollectionShape;
use freshet::Endpoint;
use freshet::EndpointBuilder;
use freshet::HttpResponse;
use freshet::HttpTransport;
use freshet::TransportError;
use http::HeaderMap;
use parking_lot::Mutex;
use serde_json::Value;

pub const URL: &str = "https://api.test/resource";

/// Transport answering from a queue of canned outcomes; an empty queue
/// answers with a network failure.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(
        &self,
        response: HttpResponse,
    ) -> &Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn if_none_match(
        &self,
        request: usize,
    ) -> Option<String> {
        self.requests.lock()[request]
            .1
            .get(http::header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    pub fn url(
        &self,
        request: usize,
    ) -> String {
        self.requests.lock()[request].0.clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push((url.to_string(), headers));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
    }
}

pub fn ok(
    etag: &str,
    body: Value,
) -> HttpResponse {
    HttpResponse::ok(body).with_header("etag", etag)
}

pub fn not_modified(etag: &str) -> HttpResponse {
    HttpResponse::not_modified().with_header("etag", etag)
}

pub fn collection_endpoint(
    transport: &Arc<ScriptedTransport>,
    builder: impl FnOnce(EndpointBuilder) -> EndpointBuilder,
) -> Endpoint<Collection> {
    builder(EndpointBuilder::new(transport.clone()).url(URL))
        .build_collection(&CollectionShape::new("etag", "items", "id"))
        .unwrap()
}
