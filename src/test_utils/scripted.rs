use std::collections::VecDeque;

use async_trait::async_trait;
use http::HeaderMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::HttpResponse;
use crate::HttpTransport;
use crate::TransportError;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn if_none_match(&self) -> Option<&str> {
        self.headers
            .get(http::header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
    }
}

/// Transport replaying a queue of canned outcomes in order.
///
/// An exhausted script answers with a network failure.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        &self,
        response: HttpResponse,
    ) -> &Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    pub fn fail(
        &self,
        error: TransportError,
    ) -> &Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Holds the next request until the returned sender fires (or is dropped).
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> std::result::Result<HttpResponse, TransportError> {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            headers,
        });

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
    }
}
