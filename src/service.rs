//! Collection service: an endpoint serving a collection-shaped payload
//! together with its index overlay.

use std::sync::Arc;

use futures::stream::BoxStream;
use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

use crate::AuthProvider;
use crate::Collection;
use crate::CollectionShape;
use crate::Endpoint;
use crate::EndpointBuilder;
use crate::HttpTransport;
use crate::IndexKey;
use crate::IndexOverlay;
use crate::LocalIndex;
use crate::NoAuth;
use crate::Result;
use crate::Settings;

#[derive(Clone)]
pub struct CollectionService {
    endpoint: Endpoint<Collection>,
    overlay: IndexOverlay,
}

impl CollectionService {
    pub fn new(
        endpoint: Endpoint<Collection>,
        shape: &CollectionShape,
    ) -> Self {
        let overlay = IndexOverlay::from_endpoint(&endpoint, shape.id_field());
        Self { endpoint, overlay }
    }

    /// Builds the endpoint and overlay described by `settings`.
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) when the settings do
    /// not validate.
    pub fn from_settings(
        settings: &Settings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        Self::from_settings_with_auth(settings, transport, NoAuth)
    }

    pub fn from_settings_with_auth(
        settings: &Settings,
        transport: Arc<dyn HttpTransport>,
        auth: impl AuthProvider,
    ) -> Result<Self> {
        settings.validate()?;
        let shape = settings.index.shape();
        let endpoint = EndpointBuilder::new(transport)
            .set_config(settings.endpoint.clone())
            .auth(auth)
            .build_collection(&shape)?;

        info!(url = ?settings.endpoint.url, id_field = shape.id_field(), "collection service ready");
        Ok(Self::new(endpoint, &shape))
    }

    pub fn endpoint(&self) -> &Endpoint<Collection> {
        &self.endpoint
    }

    /// See [`Endpoint::fetch`].
    pub async fn fetch(&self) -> Result<Option<Collection>> {
        self.endpoint.fetch().await
    }

    /// See [`Endpoint::reset`].
    pub fn reset(
        &self,
        url: Option<String>,
    ) {
        self.endpoint.reset(url)
    }

    /// Shared stream of index snapshots; the first call starts polling.
    pub fn index(&self) -> BoxStream<'static, Arc<LocalIndex>> {
        self.overlay.subscribe()
    }

    /// Lookup in the latest index by typed id. `None` until an index was
    /// published.
    pub fn load(
        &self,
        id: impl Into<IndexKey>,
    ) -> Option<Value> {
        self.overlay.load(id)
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.endpoint.loading()
    }
}
