//! The catalog follows the filesystem while the watcher runs.

mod common;

use std::time::Duration;

use common::{open_manager, settle, wait_for};
use quiver_core::ScriptPath;
use quiver_registry::RegistryEvent;
use quiver_test::{CLEAN_SCRIPT, RISKY_SCRIPT, ScriptDir, TOOLBAR_SCRIPT};

const DEBOUNCE: Duration = Duration::from_millis(100);

#[tokio::test(flavor = "multi_thread")]
async fn deleted_script_disappears_after_debounce() {
    let dir = ScriptDir::new()
        .with_script("keep.py", CLEAN_SCRIPT)
        .with_script("gone.py", CLEAN_SCRIPT);
    let manager = open_manager(&dir, DEBOUNCE).await;
    let mut events = manager.subscribe();
    let _watch = manager.start_watching().await.unwrap();
    settle().await;

    let gone = ScriptPath::new(dir.path().join("gone.py"));
    dir.remove("gone.py");

    let event = wait_for(&mut events, |e| matches!(e, RegistryEvent::Removed { .. })).await;
    assert_eq!(event, Some(RegistryEvent::Removed { path: gone.clone() }));
    assert!(manager.get_script(gone.as_path()).await.is_none());
    assert_eq!(manager.list_scripts().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn new_script_appears() {
    let dir = ScriptDir::new();
    let manager = open_manager(&dir, DEBOUNCE).await;
    let mut events = manager.subscribe();
    let _watch = manager.start_watching().await.unwrap();
    settle().await;

    dir.write("export.py", TOOLBAR_SCRIPT);

    let event = wait_for(&mut events, |e| matches!(e, RegistryEvent::Added { .. })).await;
    assert!(event.is_some(), "no Added event");
    let toolbar = manager.toolbar_scripts().await;
    assert_eq!(toolbar.len(), 1);
    assert_eq!(toolbar[0].label, "Export");
}

#[tokio::test(flavor = "multi_thread")]
async fn edit_invalidates_cached_verdict() {
    let dir = ScriptDir::new().with_script("job.py", CLEAN_SCRIPT);
    let manager = open_manager(&dir, DEBOUNCE).await;
    let path = dir.path().join("job.py");
    assert!(manager.validate(&path).await.unwrap().is_clean());

    let mut events = manager.subscribe();
    let _watch = manager.start_watching().await.unwrap();
    settle().await;

    dir.write("job.py", RISKY_SCRIPT);

    let event = wait_for(&mut events, |e| matches!(e, RegistryEvent::Updated { .. })).await;
    assert!(event.is_some(), "no Updated event");
    let entry = manager.get_script(&path).await.unwrap();
    assert_eq!(entry.title, "Cleanup");
    assert!(entry.verdict.is_none());
    assert!(!manager.validate(&path).await.unwrap().is_clean());
}

#[tokio::test(flavor = "multi_thread")]
async fn non_script_files_are_ignored() {
    let dir = ScriptDir::new().with_script("a.py", CLEAN_SCRIPT);
    let manager = open_manager(&dir, DEBOUNCE).await;
    let mut events = manager.subscribe();
    let _watch = manager.start_watching().await.unwrap();
    settle().await;

    dir.write("notes.txt", "not a script");
    dir.write("__init__.py", "");
    dir.write("b.py", CLEAN_SCRIPT);

    let event = wait_for(&mut events, |e| e.path().is_some()).await;
    assert_eq!(
        event,
        Some(RegistryEvent::Added {
            path: ScriptPath::new(dir.path().join("b.py"))
        })
    );
    assert_eq!(manager.list_scripts().await.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn script_added_before_watching_started_is_picked_up() {
    let dir = ScriptDir::new().with_script("a.py", CLEAN_SCRIPT);
    let manager = open_manager(&dir, DEBOUNCE).await;
    let mut events = manager.subscribe();
    dir.write("late.py", TOOLBAR_SCRIPT);
    dir.remove("a.py");

    let _watch = manager.start_watching().await.unwrap();

    let late = ScriptPath::new(dir.path().join("late.py"));
    let event = wait_for(&mut events, |e| matches!(e, RegistryEvent::Added { .. })).await;
    assert_eq!(event, Some(RegistryEvent::Added { path: late.clone() }));
    let event = wait_for(&mut events, |e| matches!(e, RegistryEvent::Removed { .. })).await;
    assert!(event.is_some(), "no Removed event");

    let paths: Vec<_> = manager
        .list_scripts()
        .await
        .into_iter()
        .map(|e| e.path)
        .collect();
    assert_eq!(paths, vec![late]);
}
