//! Deferred Actions
//!
//! A single cancellable deadline backed by a tokio task. Used for the
//! mini-game timeout watcher and the completion grace period.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// An action scheduled to run once after a delay.
///
/// Cancelling (or dropping) the handle aborts the task, so a cancelled
/// action never runs.
#[derive(Debug)]
pub struct DeferredAction {
    handle: JoinHandle<()>,
}

impl DeferredAction {
    /// Run `action` after `delay`. Must be called inside a tokio runtime.
    pub fn schedule<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action().await;
        });
        Self { handle }
    }

    /// Revoke the action.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for DeferredAction {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
