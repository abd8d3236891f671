use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::trace;

/// Spawns a detached background task on the ambient Tokio runtime.
///
/// Returns `None` (and logs) when called outside a runtime, so synchronous
/// entry points such as `subscribe` and `reset` never panic.
pub(crate) fn spawn_task<Fut>(
    name: &'static str,
    fut: Fut,
) -> Option<JoinHandle<()>>
where
    Fut: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            trace!(task = name, "spawning background task");
            Some(handle.spawn(fut))
        }
        Err(e) => {
            error!(task = name, "no Tokio runtime available, task not started: {e}");
            None
        }
    }
}
