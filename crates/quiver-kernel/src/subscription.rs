//! Callback subscriptions to registry changes.

use std::sync::Arc;

use quiver_registry::{RegistryEvent, RegistryEventReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Callback invoked for each registry change.
pub type ChangeCallback = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

/// Keeps a change callback registered. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Deliver events from `receiver` to `callback` on a background task.
    ///
    /// Panics in the callback are caught and logged; delivery continues.
    pub(crate) fn spawn(mut receiver: RegistryEventReceiver, callback: ChangeCallback) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    callback(&event);
                }));
                if let Err(e) = result {
                    warn!(event = %event, error = ?e, "Registry change callback panicked");
                }
            }
            debug!("Registry event bus closed, subscription ended");
        });
        Self { task }
    }

    /// Whether the callback is still receiving events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop delivering events.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
