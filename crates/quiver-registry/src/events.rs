//! Change notifications for the script catalog.

use std::fmt;
use std::sync::Arc;

use quiver_core::ScriptPath;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Default channel capacity for registry events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A change to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A script was registered.
    Added {
        /// The new script.
        path: ScriptPath,
    },
    /// A registered script was re-read.
    Updated {
        /// The changed script.
        path: ScriptPath,
    },
    /// A script left the catalog.
    Removed {
        /// The removed script.
        path: ScriptPath,
    },
    /// The whole catalog was rebuilt.
    Reloaded {
        /// Scripts registered after the rebuild.
        count: usize,
    },
}

impl RegistryEvent {
    /// Short name of the event kind.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Updated { .. } => "updated",
            Self::Removed { .. } => "removed",
            Self::Reloaded { .. } => "reloaded",
        }
    }

    /// The script concerned, if the event is about a single script.
    #[must_use]
    pub fn path(&self) -> Option<&ScriptPath> {
        match self {
            Self::Added { path } | Self::Updated { path } | Self::Removed { path } => Some(path),
            Self::Reloaded { .. } => None,
        }
    }
}

impl fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reloaded { count } => write!(f, "reloaded ({count} scripts)"),
            Self::Added { path } | Self::Updated { path } | Self::Removed { path } => {
                write!(f, "{} {path}", self.event_type())
            },
        }
    }
}

/// Broadcast bus for [`RegistryEvent`]s.
///
/// Clones share the same channel.
#[derive(Debug, Clone)]
pub struct RegistryEvents {
    sender: broadcast::Sender<Arc<RegistryEvent>>,
}

impl RegistryEvents {
    /// Create a bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns the number of receivers reached.
    pub fn publish(&self, event: RegistryEvent) -> usize {
        let event = Arc::new(event);
        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            trace!(event = %event, receivers = count, "Registry event published");
            count
        } else {
            trace!(event = %event, "No receivers for registry event");
            0
        }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> RegistryEventReceiver {
        RegistryEventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RegistryEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of [`RegistryEvents`].
pub struct RegistryEventReceiver {
    receiver: broadcast::Receiver<Arc<RegistryEvent>>,
}

impl RegistryEventReceiver {
    /// Wait for the next event.
    ///
    /// Lagging receivers skip the dropped events with a warning. Returns
    /// `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Arc<RegistryEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Registry event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<RegistryEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Registry event receiver lagged, events dropped");
                },
                Err(_) => return None,
            }
        }
    }
}

impl fmt::Debug for RegistryEventReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEventReceiver")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = RegistryEvents::new();
        let mut a = bus.subscribe();
        let mut b = bus.clone().subscribe();

        let path = ScriptPath::new("/s/a.py");
        assert_eq!(bus.publish(RegistryEvent::Added { path: path.clone() }), 2);

        assert_eq!(a.recv().await.unwrap().path(), Some(&path));
        assert_eq!(b.recv().await.unwrap().event_type(), "added");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = RegistryEvents::new();
        assert_eq!(bus.publish(RegistryEvent::Reloaded { count: 3 }), 0);
    }

    #[test]
    fn test_lagged_receiver_skips_ahead() {
        let bus = RegistryEvents::with_capacity(2);
        let mut rx = bus.subscribe();
        for count in 0..5 {
            bus.publish(RegistryEvent::Reloaded { count });
        }
        assert_eq!(*rx.try_recv().unwrap(), RegistryEvent::Reloaded { count: 3 });
        assert_eq!(*rx.try_recv().unwrap(), RegistryEvent::Reloaded { count: 4 });
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_display() {
        let event = RegistryEvent::Removed {
            path: ScriptPath::new("/s/a.py"),
        };
        assert!(event.to_string().starts_with("removed "));
        assert_eq!(
            RegistryEvent::Reloaded { count: 2 }.to_string(),
            "reloaded (2 scripts)"
        );
    }
}
