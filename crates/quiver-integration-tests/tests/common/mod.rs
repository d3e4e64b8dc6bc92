//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use quiver_kernel::{ManagerConfig, ScriptManager};
use quiver_registry::{RegistryEvent, RegistryEventReceiver};
use quiver_test::ScriptDir;

/// How long to wait for the watcher before giving up.
pub const WATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a manager over a single directory.
pub async fn open_manager(dir: &ScriptDir, debounce: Duration) -> ScriptManager {
    quiver_test::init_test_logging();
    let config = ManagerConfig::new(vec![dir.path_buf()]).with_debounce(debounce);
    let (manager, report) = ScriptManager::open(config).await;
    assert!(report.is_complete(), "discovery failed: {report:?}");
    manager
}

/// Receive events until one satisfies `pred`, or time out.
pub async fn wait_for<F>(events: &mut RegistryEventReceiver, pred: F) -> Option<RegistryEvent>
where
    F: Fn(&RegistryEvent) -> bool,
{
    tokio::time::timeout(WATCH_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            if pred(&event) {
                return Some((*event).clone());
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Give the file watcher time to register its watches.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}
