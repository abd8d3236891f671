use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::Endpoint;
use crate::json_converter;
use crate::partial_eq;
use crate::AuthProvider;
use crate::Collection;
use crate::CollectionShape;
use crate::Converter;
use crate::EndpointConfig;
use crate::Equality;
use crate::HttpTransport;
use crate::NoAuth;
use crate::Result;

pub struct EndpointBuilder {
    config: EndpointConfig,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
}

impl EndpointBuilder {
    /// Create a new builder with default policy over `transport`
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config: EndpointConfig::default(),
            transport,
            auth: Arc::new(NoAuth),
        }
    }

    /// Resource URL (may also be supplied later through `reset`)
    pub fn url(
        mut self,
        url: impl Into<String>,
    ) -> Self {
        self.config.url = Some(url.into());
        self
    }

    /// Client-side refresh interval, independent of the server's `Expires`
    pub fn refresh_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        self.config.refresh_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Fetch even when a known value carries no freshness signal (default: off)
    pub fn fetch_refreshes_without_interval(
        mut self,
        enable: bool,
    ) -> Self {
        self.config.fetch_refreshes_without_interval = enable;
        self
    }

    /// Poll delay used when a resource is due again right after a fetch (default: 1s)
    pub fn min_poll_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        self.config.min_poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Change stream buffer per subscriber (default: 16)
    pub fn change_buffer(
        mut self,
        capacity: usize,
    ) -> Self {
        self.config.change_buffer = capacity;
        self
    }

    /// Header supplier merged into every request (default: none)
    pub fn auth(
        mut self,
        auth: impl AuthProvider,
    ) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    /// Completely replaces the policy configured so far.
    ///
    /// Settings applied earlier through [`url`](EndpointBuilder::url),
    /// [`refresh_interval`](EndpointBuilder::refresh_interval) and the other
    /// granular methods are discarded.
    pub fn set_config(
        mut self,
        config: EndpointConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Build an endpoint with caller-supplied conversion and equality.
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) when the policy does
    /// not validate.
    pub fn build<T>(
        self,
        converter: Converter<T>,
        equality: Equality<T>,
    ) -> Result<Endpoint<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.config.validate()?;
        Ok(Endpoint::new(&self.config, self.transport, self.auth, converter, equality))
    }

    /// Build an endpoint that deserializes with serde and compares with `PartialEq`.
    pub fn build_json<T>(self) -> Result<Endpoint<T>>
    where
        T: DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
    {
        self.build(json_converter(), partial_eq())
    }

    /// Build a collection endpoint whose change detection follows the
    /// payload's version field.
    pub fn build_collection(
        self,
        shape: &CollectionShape,
    ) -> Result<Endpoint<Collection>> {
        self.build(shape.converter(), shape.equality())
    }
}
