use std::any::Any;
use std::pin::Pin;
use std::sync::Arc;
use std::task::ready;
use std::task::Context;
use std::task::Poll;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;
use tracing::trace;

use crate::Error;

/// Subscriber-count transition callback
pub type Hook = Box<dyn Fn() + Send + Sync>;

/// Item delivered to subscribers; a terminal error ends the subscription.
pub type StreamItem<T> = std::result::Result<T, Arc<Error>>;

#[derive(Clone)]
enum Event<T> {
    Next(T),
    Failed(Arc<Error>),
}

struct Shared<T> {
    latest: Option<T>,
    subscribers: usize,
    /// Bumped on every terminal failure; subscriptions from an older epoch no
    /// longer count towards `subscribers`.
    epoch: u64,
}

struct DemandInner<T> {
    /// Held across a subscriber-count transition and its hook, so a start and
    /// a stop can never run out of order.
    transition: Mutex<()>,
    shared: Mutex<Shared<T>>,
    sender: broadcast::Sender<Event<T>>,
    on_start: Hook,
    on_stop: Hook,
}

/// Multicast stream whose subscriber count drives a start/stop resource.
pub struct DemandStream<T> {
    inner: Arc<DemandInner<T>>,
}

impl<T> DemandStream<T>
where
    T: Clone + Send + 'static,
{
    /// # Arguments
    /// * `capacity` - live buffer per subscriber; slower subscribers skip ahead
    /// * `on_start` - invoked on the zero-to-one subscriber transition
    /// * `on_stop` - invoked on the one-to-zero transition, and when a terminal
    ///   failure releases the current subscribers
    pub fn new(
        capacity: usize,
        on_start: Hook,
        on_stop: Hook,
    ) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(DemandInner {
                transition: Mutex::new(()),
                shared: Mutex::new(Shared {
                    latest: None,
                    subscribers: 0,
                    epoch: 0,
                }),
                sender,
                on_start,
                on_stop,
            }),
        }
    }

    /// Admits a new subscriber.
    ///
    /// The replayed value and the live receiver are captured atomically with
    /// respect to [`emit`](Self::emit), so a subscriber never misses or
    /// duplicates an emission.
    pub fn subscribe(&self) -> Subscription<T> {
        let _transition = self.inner.transition.lock();
        let (receiver, initial, epoch, first) = {
            let mut shared = self.inner.shared.lock();
            shared.subscribers += 1;
            (
                self.inner.sender.subscribe(),
                shared.latest.clone(),
                shared.epoch,
                shared.subscribers == 1,
            )
        };

        if first {
            debug!("first subscriber, starting");
            (self.inner.on_start)();
        }

        Subscription {
            initial,
            events: BroadcastStream::new(receiver),
            done: false,
            epoch,
            inner: self.inner.clone(),
            _owner: None,
        }
    }

    /// Records `value` as the latest and pushes it to every live subscriber.
    pub fn emit(
        &self,
        value: T,
    ) {
        let mut shared = self.inner.shared.lock();
        shared.latest = Some(value.clone());
        // No receivers is fine: the value is still replayed to the next one.
        let _ = self.inner.sender.send(Event::Next(value));
    }

    /// Ends every current subscription with `error`.
    ///
    /// Returns `true` if there were subscribers to notify. The next subscriber
    /// after a failure triggers a fresh start.
    pub fn fail(
        &self,
        error: Arc<Error>,
    ) -> bool {
        let _transition = self.inner.transition.lock();
        let had_subscribers = {
            let mut shared = self.inner.shared.lock();
            let had_subscribers = shared.subscribers > 0;
            shared.subscribers = 0;
            shared.epoch += 1;
            let _ = self.inner.sender.send(Event::Failed(error));
            had_subscribers
        };

        if had_subscribers {
            debug!("terminal failure delivered, stopping");
            (self.inner.on_stop)();
        }
        had_subscribers
    }

    /// Forgets the replay value (no emission).
    pub fn clear(&self) {
        self.inner.shared.lock().latest = None;
    }

    pub fn latest(&self) -> Option<T> {
        self.inner.shared.lock().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.shared.lock().subscribers
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Runs `f` with the current subscriber count while no subscriber can
    /// arrive or leave.
    pub fn while_settled<R>(
        &self,
        f: impl FnOnce(usize) -> R,
    ) -> R {
        let _transition = self.inner.transition.lock();
        let subscribers = self.subscriber_count();
        f(subscribers)
    }
}

/// One subscriber's view of a [`DemandStream`].
///
/// Yields the replayed value first (ready on the first poll, without
/// waiting), then live values in emission order. Ends after a terminal
/// error. Dropping the last live subscription runs the stop hook.
pub struct Subscription<T> {
    initial: Option<T>,
    events: BroadcastStream<Event<T>>,
    done: bool,
    epoch: u64,
    inner: Arc<DemandInner<T>>,
    _owner: Option<Arc<dyn Any + Send + Sync>>,
}

impl<T> Subscription<T> {
    /// Keeps `owner` alive for as long as this subscription exists.
    pub(crate) fn retain(
        mut self,
        owner: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        self._owner = Some(owner);
        self
    }

    /// Whether a terminal error (or channel closure) has ended this subscription.
    pub fn is_terminated(&self) -> bool {
        self.done
    }
}

// No field is structurally pinned.
impl<T> Unpin for Subscription<T> {}

impl<T> Stream for Subscription<T>
where
    T: Clone + Send + 'static,
{
    type Item = StreamItem<T>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if let Some(value) = this.initial.take() {
            return Poll::Ready(Some(Ok(value)));
        }

        loop {
            match ready!(Pin::new(&mut this.events).poll_next(cx)) {
                Some(Ok(Event::Next(value))) => return Poll::Ready(Some(Ok(value))),
                Some(Ok(Event::Failed(error))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(error)));
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    trace!(skipped, "subscriber lagged, skipping to newer values");
                }
                None => {
                    this.done = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let _transition = self.inner.transition.lock();
        let last = {
            let mut shared = self.inner.shared.lock();
            if shared.epoch != self.epoch {
                false
            } else {
                shared.subscribers = shared.subscribers.saturating_sub(1);
                shared.subscribers == 0
            }
        };

        if last {
            debug!("last subscriber gone, stopping");
            (self.inner.on_stop)();
        }
    }
}
