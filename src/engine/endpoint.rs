use std::any::Any;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;
use std::time::SystemTime;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::poller::PollHandle;
use super::state::EndpointState;
use super::Freshness;
use super::FreshnessInputs;
use crate::metrics::observe_request;
use crate::metrics::record_fetch_outcome;
use crate::metrics::FetchOutcome;
use crate::request_headers;
use crate::AuthProvider;
use crate::Converter;
use crate::DemandStream;
use crate::EndpointConfig;
use crate::Equality;
use crate::Error;
use crate::FetchError;
use crate::HttpResponse;
use crate::HttpTransport;
use crate::Result;
use crate::Subscription;
use crate::TransportError;

/// Raises the loading flag and lowers it again when dropped, including when
/// the request future is cancelled.
struct LoadingGuard<'a> {
    loading: &'a watch::Sender<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn raise(loading: &'a watch::Sender<bool>) -> Self {
        loading.send_replace(true);
        Self { loading }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.send_replace(false);
    }
}

/// Freshness policy fixed at construction
#[derive(Debug, Clone)]
pub(crate) struct Policy {
    pub(crate) refresh_interval: Option<Duration>,
    pub(crate) fetch_refreshes_without_interval: bool,
    pub(crate) min_poll_interval: Duration,
}

impl From<&EndpointConfig> for Policy {
    fn from(config: &EndpointConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            fetch_refreshes_without_interval: config.fetch_refreshes_without_interval,
            min_poll_interval: config.min_poll_interval(),
        }
    }
}

pub(crate) struct EndpointInner<T> {
    state: Mutex<EndpointState<T>>,
    pub(crate) policy: Policy,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
    converter: Converter<T>,
    equality: Equality<T>,
    pub(crate) changes: DemandStream<T>,
    loading: watch::Sender<bool>,
    pub(crate) poller: Mutex<Option<PollHandle>>,
}

/// Handle to one cached HTTP resource.
///
/// Cloning is cheap; all clones share the same cache state, change stream
/// and poll loop.
pub struct Endpoint<T> {
    inner: Arc<EndpointInner<T>>,
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Endpoint<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        config: &EndpointConfig,
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthProvider>,
        converter: Converter<T>,
        equality: Equality<T>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<EndpointInner<T>>| {
            let on_start = {
                let weak = weak.clone();
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.start_polling();
                    }
                })
            };
            let on_stop = {
                let weak = weak.clone();
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.stop_polling();
                    }
                })
            };

            EndpointInner {
                state: Mutex::new(EndpointState::new(config.url.clone())),
                policy: Policy::from(config),
                transport,
                auth,
                converter,
                equality,
                changes: DemandStream::new(config.change_buffer, on_start, on_stop),
                loading: watch::channel(false).0,
                poller: Mutex::new(None),
            }
        });

        Self { inner }
    }

    /// Returns the best-known value, contacting the server only when the
    /// cached one is no longer fresh.
    ///
    /// # Errors
    /// - [`FetchError::MissingUrl`] when a request is needed but no URL is set
    /// - [`FetchError::UnexpectedResponse`] for any status other than 200/304
    /// - [`FetchError::Convert`] when the converter rejects the payload
    /// - [`FetchError::Transport`] when no response was received
    ///
    /// Unexpected statuses and conversion failures also end the change
    /// stream for its current subscribers.
    pub async fn fetch(&self) -> Result<Option<T>> {
        match self.inner.fetch_inner(false).await {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_terminal() && self.inner.changes.fail(Arc::new(Error::Fetch(e.clone()))) {
                    warn!("fetch failed, change stream terminated: {e}");
                }
                Err(e.into())
            }
        }
    }

    /// Forces revalidation, optionally switching to a different resource.
    ///
    /// Validators and the last fetch time are always cleared. A URL different
    /// from the current one also drops the cached value. While observed, the
    /// poll loop is restarted so the new freshness is evaluated immediately.
    pub fn reset(
        &self,
        url: Option<String>,
    ) {
        {
            let mut state = self.inner.state.lock();
            state.clear_validators();
            if let Some(url) = url {
                if state.url.as_deref() != Some(url.as_str()) {
                    info!(from = ?state.url, to = %url, "switching endpoint url");
                    state.url = Some(url);
                    state.value = None;
                    self.inner.changes.clear();
                }
            }
        }

        self.inner.changes.while_settled(|subscribers| {
            if subscribers > 0 || self.inner.is_polling() {
                debug!("reset while observed, re-evaluating now");
                self.inner.start_polling();
            }
        });
    }

    /// Subscribes to accepted value changes.
    ///
    /// The first subscriber starts polling; dropping the last one stops it.
    /// A known value is replayed first. The subscription keeps the endpoint
    /// alive.
    pub fn changes(&self) -> Subscription<T> {
        let owner: Arc<dyn Any + Send + Sync> = self.inner.clone();
        self.inner.changes.subscribe().retain(owner)
    }

    /// `true` while a request is in flight.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    pub fn current(&self) -> Option<T> {
        self.inner.state.lock().value.clone()
    }

    pub fn url(&self) -> Option<String> {
        self.inner.state.lock().url.clone()
    }

    pub fn etag(&self) -> Option<String> {
        self.inner.state.lock().etag.clone()
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.inner.state.lock().expires_at
    }

    pub fn last_fetch(&self) -> Option<Instant> {
        self.inner.state.lock().last_fetch
    }

    pub fn freshness(&self) -> Freshness {
        self.inner.freshness()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.is_polling()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.subscriber_count()
    }
}

impl<T> EndpointInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn freshness(&self) -> Freshness {
        let state = self.state.lock();
        self.evaluate(&state)
    }

    fn evaluate(
        &self,
        state: &EndpointState<T>,
    ) -> Freshness {
        FreshnessInputs {
            expires_at: state.expires_at,
            last_fetch: state.last_fetch,
            refresh_interval: self.policy.refresh_interval,
            has_value: state.value.is_some(),
        }
        .evaluate(Instant::now(), SystemTime::now())
    }

    /// `polling` turns a 304 reported as a transport failure into a
    /// revalidation instead of an error.
    pub(crate) async fn fetch_inner(
        &self,
        polling: bool,
    ) -> std::result::Result<Option<T>, FetchError> {
        self.fetch_once(polling).await.inspect_err(|e| {
            record_fetch_outcome(FetchOutcome::Failed);
            debug!("fetch failed: {e}");
        })
    }

    async fn fetch_once(
        &self,
        polling: bool,
    ) -> std::result::Result<Option<T>, FetchError> {
        let (url, etag) = {
            let state = self.state.lock();
            match self.evaluate(&state) {
                Freshness::Fresh(remaining) => {
                    trace!(?remaining, "still fresh, serving cached value");
                    record_fetch_outcome(FetchOutcome::Fresh);
                    return Ok(state.value.clone());
                }
                Freshness::Untimed if !self.policy.fetch_refreshes_without_interval => {
                    trace!("no freshness signal, serving cached value");
                    record_fetch_outcome(FetchOutcome::Untimed);
                    return Ok(state.value.clone());
                }
                Freshness::Untimed | Freshness::Due => {}
            }

            let url = state.url.clone().ok_or(FetchError::MissingUrl)?;
            (url, state.etag.clone())
        };

        let headers = request_headers(self.auth.as_ref(), etag.as_deref());
        debug!(%url, revalidating = etag.is_some(), "requesting");

        let result = {
            let _loading = LoadingGuard::raise(&self.loading);
            let started = Instant::now();
            let result = self.transport.get(&url, headers).await;
            observe_request(
                result.as_ref().ok().map(|response| response.status),
                started.elapsed().as_secs_f64() * 1000.0,
            );
            result
        };

        let response = match result {
            Ok(response) => response,
            Err(TransportError::Status { status: 304, headers }) if polling => {
                trace!(%url, "not modified reported as failure, treating as revalidation");
                HttpResponse {
                    status: 304,
                    headers,
                    body: None,
                }
            }
            Err(e) => return Err(e.into()),
        };
        self.apply(&url, response)
    }

    /// Folds a completed response into the cache state.
    ///
    /// Conversion runs before anything is mutated, so a rejected payload
    /// leaves the previous state intact.
    fn apply(
        &self,
        url: &str,
        response: HttpResponse,
    ) -> std::result::Result<Option<T>, FetchError> {
        let HttpResponse { status, headers, body } = response;
        if status != 200 && status != 304 {
            return Err(FetchError::UnexpectedResponse { status, headers });
        }

        let converted = match body {
            Some(body) if status == 200 && !body.is_null() => Some((self.converter)(body).map_err(FetchError::Convert)?),
            _ => None,
        };

        let mut state = self.state.lock();
        if state.url.as_deref() != Some(url) {
            debug!(%url, "url changed while the request was in flight, discarding response");
            return Ok(state.value.clone());
        }
        state.record_validators(&headers, Instant::now());

        if status == 304 {
            trace!(%url, "not modified");
            record_fetch_outcome(FetchOutcome::NotModified);
            return Ok(state.value.clone());
        }

        match converted {
            None => {
                warn!(%url, "200 response without a body, keeping cached value");
                record_fetch_outcome(FetchOutcome::EmptyBody);
            }
            Some(new) => {
                let changed = match &state.value {
                    Some(old) => !(self.equality)(old, &new),
                    None => true,
                };
                if changed {
                    debug!(%url, "value changed");
                    state.value = Some(new.clone());
                    self.changes.emit(new);
                    record_fetch_outcome(FetchOutcome::Modified);
                } else {
                    trace!(%url, "payload equal to cached value, suppressed");
                    record_fetch_outcome(FetchOutcome::Unchanged);
                }
            }
        }

        Ok(state.value.clone())
    }

    /// One fetch on behalf of the poll loop. Returns whether polling should
    /// continue.
    pub(crate) async fn poll_fetch(&self) -> bool {
        match self.fetch_inner(true).await {
            Ok(_) => true,
            Err(FetchError::MissingUrl) => {
                warn!("polling paused until a url is set");
                false
            }
            Err(e) if e.is_terminal() => {
                error!("polling failed, terminating change stream: {e}");
                self.changes.fail(Arc::new(Error::Fetch(e)));
                false
            }
            Err(e) => {
                warn!("polling fetch failed, will retry: {e}");
                true
            }
        }
    }
}
