use std::sync::Arc;
use std::sync::Weak;

use arc_swap::ArcSwapOption;
use futures::future;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;
use tracing::warn;

use super::Collection;
use super::IndexKey;
use super::LocalIndex;
use crate::utils::async_task::spawn_task;
use crate::Endpoint;
use crate::StreamItem;

/// Opens one upstream subscription when called.
pub type UpstreamFactory = Box<dyn Fn() -> BoxStream<'static, StreamItem<Collection>> + Send + Sync>;

struct OverlayInner {
    upstream: UpstreamFactory,
    id_field: String,
    sender: watch::Sender<Option<Arc<LocalIndex>>>,
    current: ArcSwapOption<LocalIndex>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

/// Shared stream of [`LocalIndex`] snapshots over an upstream collection
/// stream.
///
/// The upstream is subscribed once, on the first [`subscribe`](Self::subscribe);
/// every consumer shares it. Late consumers start from the latest index.
/// An upstream failure is logged and turned into one empty index; the next
/// `subscribe` after that reopens the upstream.
#[derive(Clone)]
pub struct IndexOverlay {
    inner: Arc<OverlayInner>,
}

impl IndexOverlay {
    pub fn new<F>(
        upstream: F,
        id_field: impl Into<String>,
    ) -> Self
    where
        F: Fn() -> BoxStream<'static, StreamItem<Collection>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(OverlayInner {
                upstream: Box::new(upstream),
                id_field: id_field.into(),
                sender: watch::channel(None).0,
                current: ArcSwapOption::empty(),
                pump: Mutex::new(None),
            }),
        }
    }

    /// Overlay fed by `endpoint`'s change stream.
    pub fn from_endpoint(
        endpoint: &Endpoint<Collection>,
        id_field: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.clone();
        Self::new(move || endpoint.changes().boxed(), id_field)
    }

    /// Stream of index snapshots, starting with the latest one if any.
    ///
    /// Only the newest snapshot is kept for a slow consumer.
    pub fn subscribe(&self) -> BoxStream<'static, Arc<LocalIndex>> {
        let receiver = self.inner.sender.subscribe();
        self.ensure_started();
        WatchStream::new(receiver)
            .filter_map(future::ready)
            .boxed()
    }

    /// Latest published index, without waiting.
    pub fn latest(&self) -> Option<Arc<LocalIndex>> {
        self.inner.current.load_full()
    }

    /// Synchronous lookup against the latest index.
    pub fn load(
        &self,
        id: impl Into<IndexKey>,
    ) -> Option<Value> {
        self.inner
            .current
            .load()
            .as_ref()
            .and_then(|index| index.load(id).cloned())
    }

    /// Whether the upstream subscription is currently open.
    pub fn is_connected(&self) -> bool {
        self.inner
            .pump
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn ensure_started(&self) {
        let mut pump = self.inner.pump.lock();
        if pump.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        debug!("opening upstream collection stream");
        let upstream = (self.inner.upstream)();
        *pump = spawn_task("index-overlay", run(Arc::downgrade(&self.inner), upstream));
    }
}

impl OverlayInner {
    fn publish(
        &self,
        index: LocalIndex,
    ) {
        let index = Arc::new(index);
        self.current.store(Some(index.clone()));
        self.sender.send_replace(Some(index));
    }
}

impl Drop for OverlayInner {
    fn drop(&mut self) {
        if let Some(task) = self.pump.get_mut().take() {
            task.abort();
        }
    }
}

async fn run(
    overlay: Weak<OverlayInner>,
    mut upstream: BoxStream<'static, StreamItem<Collection>>,
) {
    while let Some(item) = upstream.next().await {
        let Some(inner) = overlay.upgrade() else {
            return;
        };

        match item {
            Ok(collection) => {
                let index = LocalIndex::build(&collection.items, &inner.id_field);
                debug!(version = ?collection.version, items = index.len(), "publishing index");
                inner.publish(index);
            }
            Err(e) => {
                warn!("upstream collection stream failed, publishing empty index: {e}");
                inner.publish(LocalIndex::empty());
            }
        }
    }
    debug!("upstream collection stream ended");
}
