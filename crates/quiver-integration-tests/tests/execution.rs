//! Running scripts through the manager.

mod common;

use std::time::Duration;

use common::open_manager;
use quiver_core::ExecutionOutcome;
use quiver_kernel::{ManagerConfig, ScriptManager};
use quiver_runner::EngineConfig;
use quiver_test::{FAILING_SCRIPT, SLOW_SCRIPT, ScriptDir, WORKED_EXAMPLE, python_available};

#[tokio::test]
async fn worked_example_completes_with_its_output() {
    if !python_available() {
        return;
    }
    let dir = ScriptDir::new().with_script("ab.py", WORKED_EXAMPLE);
    let manager = open_manager(&dir, Duration::ZERO).await;
    let path = dir.path().join("ab.py");

    let entry = manager.get_script(&path).await.unwrap();
    assert_eq!(entry.description, "test");
    assert_eq!(entry.title, "Ab");

    let result = manager.run(&path).await.unwrap().wait().await;
    assert_eq!(result.outcome, ExecutionOutcome::Completed);
    assert_eq!(result.stdout_lines(), vec!["a", "b"]);
    assert!(result.is_success());
}

#[tokio::test]
async fn uncaught_error_fails_with_message() {
    if !python_available() {
        return;
    }
    let dir = ScriptDir::new().with_script("fail.py", FAILING_SCRIPT);
    let manager = open_manager(&dir, Duration::ZERO).await;

    let result = manager.run(dir.path().join("fail.py")).await.unwrap().wait().await;

    match result.outcome {
        ExecutionOutcome::Failed { ref message, ref trace } => {
            assert!(!message.is_empty());
            assert!(message.contains("ValueError"), "{message}");
            let trace = trace.as_ref().unwrap();
            assert!(trace.iter().any(|f| f.function == "main" && f.line == 2));
        },
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(result.stderr_lines().is_empty());
}

#[tokio::test]
async fn run_past_timeout_fails() {
    if !python_available() {
        return;
    }
    let dir = ScriptDir::new().with_script("slow.py", SLOW_SCRIPT);
    let engine = EngineConfig::default().with_timeout(Duration::from_millis(500));
    let config = ManagerConfig::new(vec![dir.path_buf()]).with_engine(engine);
    let (manager, _) = ScriptManager::open(config).await;

    let result = manager.run(dir.path().join("slow.py")).await.unwrap().wait().await;
    match result.outcome {
        ExecutionOutcome::Failed { ref message, .. } => {
            assert!(message.contains("timed out"), "{message}");
        },
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(result.stdout_lines(), vec!["ready"]);
}
