use std::sync::Mutex;
use std::time::Duration;

use quiver_core::ExecutionOutcome;
use quiver_test::{
    CLEAN_SCRIPT, FAILING_SCRIPT, RISKY_SCRIPT, SLOW_SCRIPT, ScriptDir, TOOLBAR_SCRIPT,
    VALIDATED_RISKY_SCRIPT, WORKED_EXAMPLE, python_available,
};

use super::*;

async fn manager_for(dir: &ScriptDir) -> ScriptManager {
    let config = ManagerConfig::new(vec![dir.path_buf()]).with_debounce(Duration::ZERO);
    ScriptManager::open(config).await.0
}

#[tokio::test]
async fn test_list_and_get() {
    let dir = ScriptDir::new()
        .with_script("greet.py", CLEAN_SCRIPT)
        .with_script("export.py", TOOLBAR_SCRIPT);
    let manager = manager_for(&dir).await;

    let titles: Vec<_> = manager
        .list_scripts()
        .await
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, vec!["Export Data", "Greeting"]);

    let entry = manager.get_script(dir.path().join("greet.py")).await.unwrap();
    assert_eq!(entry.description, "Says hello");

    let toolbar = manager.toolbar_scripts().await;
    assert_eq!(toolbar.len(), 1);
    assert_eq!(toolbar[0].label, "Export");
}

#[tokio::test]
async fn test_gate_flow_for_flagged_scripts() {
    let dir = ScriptDir::new()
        .with_script("risky.py", RISKY_SCRIPT)
        .with_script("reviewed.py", VALIDATED_RISKY_SCRIPT);
    let manager = manager_for(&dir).await;

    for name in ["risky.py", "reviewed.py"] {
        let path = dir.path().join(name);
        match manager.request_execution(&path).await.unwrap() {
            GateDecision::RequiresAcknowledgment { reasons } => {
                assert_eq!(reasons[0].rule, "os.system");
                assert_eq!(reasons[0].line, 6);
            },
            other => panic!("expected acknowledgment for {name}, got {other:?}"),
        }

        manager.acknowledge(&path);
        assert_eq!(
            manager.request_execution(&path).await.unwrap(),
            GateDecision::Allowed
        );
    }
}

#[tokio::test]
async fn test_run_refused_without_acknowledgment() {
    let dir = ScriptDir::new().with_script("risky.py", RISKY_SCRIPT);
    let manager = manager_for(&dir).await;

    let err = manager.run(dir.path().join("risky.py")).await.unwrap_err();
    match err {
        KernelError::NotAllowed { decision, .. } => {
            assert!(matches!(
                decision,
                GateDecision::RequiresAcknowledgment { .. }
            ));
        },
        other => panic!("expected NotAllowed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_script() {
    let dir = ScriptDir::new();
    let manager = manager_for(&dir).await;
    assert!(matches!(
        manager.validate(dir.path().join("nope.py")).await,
        Err(KernelError::Registry(RegistryError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_run_worked_example() {
    if !python_available() {
        return;
    }
    let dir = ScriptDir::new().with_script("ab.py", WORKED_EXAMPLE);
    let manager = manager_for(&dir).await;

    let mut handle = manager.run(dir.path().join("ab.py")).await.unwrap();
    let mut live = Vec::new();
    while let Some(line) = handle.next_line().await {
        live.push(line.text);
    }
    let result = handle.wait().await;

    assert_eq!(result.outcome, ExecutionOutcome::Completed);
    assert_eq!(result.stdout_lines(), vec!["a", "b"]);
    assert_eq!(live, vec!["a", "b"]);
}

#[tokio::test]
async fn test_run_failure_is_reported() {
    if !python_available() {
        return;
    }
    let dir = ScriptDir::new().with_script("fail.py", FAILING_SCRIPT);
    let manager = manager_for(&dir).await;

    let result = manager.run(dir.path().join("fail.py")).await.unwrap().wait().await;
    match result.outcome {
        ExecutionOutcome::Failed { message, .. } => {
            assert!(message.contains("bad input"), "{message}");
        },
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_active_run_per_script() {
    if !python_available() {
        return;
    }
    let dir = ScriptDir::new().with_script("slow.py", SLOW_SCRIPT);
    let manager = manager_for(&dir).await;
    let path = dir.path().join("slow.py");

    let mut first = manager.run(&path).await.unwrap();
    let ready = tokio::time::timeout(Duration::from_secs(10), first.next_line())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ready.text, "ready");
    assert!(manager.is_running(&path));

    assert!(matches!(
        manager.run(&path).await,
        Err(KernelError::AlreadyRunning(_))
    ));

    first.cancel();
    assert_eq!(first.wait().await.outcome, ExecutionOutcome::Cancelled);
    assert!(!manager.is_running(&path));
}

#[tokio::test]
async fn test_change_callback_sees_reload() {
    let dir = ScriptDir::new().with_script("a.py", CLEAN_SCRIPT);
    let manager = manager_for(&dir).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handle = manager.on_registry_changed(move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    manager.reload().await;
    for _ in 0..50 {
        if !seen.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(
        seen.lock().unwrap().first(),
        Some(&RegistryEvent::Reloaded { count: 1 })
    );
    assert!(handle.is_active());
}

#[tokio::test]
async fn test_reload_keeps_acknowledgments() {
    let dir = ScriptDir::new().with_script("risky.py", RISKY_SCRIPT);
    let manager = manager_for(&dir).await;
    let path = dir.path().join("risky.py");

    manager.acknowledge(&path);
    manager.reload().await;
    assert_eq!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::Allowed
    );
}

#[tokio::test]
async fn test_start_watching_without_directories() {
    let dir = ScriptDir::new();
    let config = ManagerConfig::new(vec![dir.path().join("missing")]);
    let (manager, _) = ScriptManager::open(config).await;
    assert!(matches!(
        manager.start_watching().await,
        Err(KernelError::Watch(WatchError::NoWatchableDirectories))
    ));
}

#[tokio::test]
async fn test_ensure_example_script() {
    let dir = ScriptDir::new();
    let manager = manager_for(&dir).await;

    let written = manager
        .ensure_example_script(dir.path())
        .await
        .unwrap()
        .unwrap();
    let entry = manager.get_script(&written).await.unwrap();
    assert_eq!(entry.title, "Layers Example");

    assert!(
        manager
            .ensure_example_script(dir.path())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_rewritten_script_is_gated_again_without_watcher() {
    let dir = ScriptDir::new().with_script("job.py", CLEAN_SCRIPT);
    let manager = manager_for(&dir).await;
    let path = dir.path().join("job.py");
    assert!(manager.validate(&path).await.unwrap().is_clean());
    assert_eq!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::Allowed
    );

    dir.write("job.py", "import os\nos.system('echo changed')\n");

    match manager.request_execution(&path).await.unwrap() {
        GateDecision::RequiresAcknowledgment { reasons } => {
            assert_eq!(reasons[0].rule, "os.system");
            assert_eq!(reasons[0].line, 2);
        },
        other => panic!("expected acknowledgment, got {other:?}"),
    }
    assert!(matches!(
        manager.run(&path).await,
        Err(KernelError::NotAllowed { .. })
    ));
}

#[tokio::test]
async fn test_run_uses_current_file_contents() {
    if !python_available() {
        return;
    }
    let dir = ScriptDir::new().with_script("ab.py", WORKED_EXAMPLE);
    let manager = manager_for(&dir).await;
    let path = dir.path().join("ab.py");
    assert!(manager.validate(&path).await.unwrap().is_clean());

    dir.write("ab.py", "print('c')\n");
    let result = manager.run(&path).await.unwrap().wait().await;
    assert_eq!(result.stdout_lines(), vec!["c"]);
}
