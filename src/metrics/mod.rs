use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

lazy_static! {
    pub static ref FETCH_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("freshet_fetch_outcomes", "Fetch invocations by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref REQUEST_DURATION_MS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("freshet_request_duration_ms", "Histogram of conditional GET duration in ms")
            .buckets(exponential_buckets(1.0, 2.0, 16).expect("valid buckets")),
        &["status"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

/// Label values of [`FETCH_OUTCOMES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from cache inside the freshness window
    Fresh,
    /// Served from cache, resource has no freshness signal
    Untimed,
    /// 200 accepted as a new value
    Modified,
    /// 200 judged equal to the cached value
    Unchanged,
    NotModified,
    EmptyBody,
    Failed,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Fresh => "fresh",
            FetchOutcome::Untimed => "untimed",
            FetchOutcome::Modified => "modified",
            FetchOutcome::Unchanged => "unchanged",
            FetchOutcome::NotModified => "not_modified",
            FetchOutcome::EmptyBody => "empty_body",
            FetchOutcome::Failed => "failed",
        }
    }
}

pub(crate) fn record_fetch_outcome(outcome: FetchOutcome) {
    FETCH_OUTCOMES.with_label_values(&[outcome.as_str()]).inc();
}

/// `status` is the HTTP status, or `error` when no response arrived.
pub(crate) fn observe_request(
    status: Option<u16>,
    elapsed_ms: f64,
) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    REQUEST_DURATION_MS
        .with_label_values(&[status.as_str()])
        .observe(elapsed_ms);
}

pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(FETCH_OUTCOMES.clone()))?;
    registry.register(Box::new(REQUEST_DURATION_MS.clone()))?;
    Ok(())
}

/// Renders `registry` in the Prometheus text format.
pub fn encode_metrics(registry: &Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}

#[cfg(test)]
mod metrics_test;
