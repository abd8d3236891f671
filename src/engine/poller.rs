use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

use super::endpoint::EndpointInner;
use super::Freshness;
use crate::utils::async_task::spawn_task;

/// A running poll loop. Dropping the handle cancels the loop; a request
/// already in flight still completes.
pub(crate) struct PollHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl<T> EndpointInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// (Re)arms the poll loop from the current freshness.
    ///
    /// A resource without any freshness signal still gets one opportunistic
    /// fetch; the loop ends after it.
    pub(crate) fn start_polling(self: &Arc<Self>) {
        self.stop_polling();

        let freshness = self.freshness();
        let first_wait = freshness.wait().unwrap_or(Duration::ZERO);
        debug!(?freshness, "starting poll loop");

        let token = CancellationToken::new();
        let task = spawn_task(
            "endpoint-poller",
            run(Arc::downgrade(self), token.clone(), first_wait),
        );
        *self.poller.lock() = Some(PollHandle { token, task });
    }

    pub(crate) fn stop_polling(&self) {
        if let Some(handle) = self.poller.lock().take() {
            debug!("stopping poll loop");
            drop(handle);
        }
    }

    pub(crate) fn is_polling(&self) -> bool {
        self.poller.lock().as_ref().is_some_and(PollHandle::is_active)
    }
}

async fn run<T>(
    endpoint: Weak<EndpointInner<T>>,
    token: CancellationToken,
    first_wait: Duration,
) where
    T: Clone + Send + Sync + 'static,
{
    let mut wait = first_wait;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = sleep(wait) => {}
        }

        let Some(inner) = endpoint.upgrade() else {
            return;
        };
        if !inner.changes.has_subscribers() {
            trace!("timer fired without subscribers");
            return;
        }

        if !inner.poll_fetch().await || token.is_cancelled() || !inner.changes.has_subscribers() {
            return;
        }

        wait = match inner.freshness() {
            Freshness::Untimed => {
                trace!("no freshness signal, poll loop done");
                return;
            }
            Freshness::Due => inner.policy.min_poll_interval,
            Freshness::Fresh(remaining) => remaining,
        };
        trace!(?wait, "next poll armed");
    }
}
