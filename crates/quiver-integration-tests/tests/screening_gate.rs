//! Screening verdicts and the run gate, end to end through the manager.

mod common;

use std::time::Duration;

use common::open_manager;
use quiver_core::{GateDecision, ValidationVerdict};
use quiver_kernel::KernelError;
use quiver_test::{
    CLEAN_SCRIPT, DECOY_SCRIPT, RISKY_SCRIPT, ScriptDir, VALIDATED_RISKY_SCRIPT,
};

#[tokio::test]
async fn clean_script_is_clean_every_time() {
    let dir = ScriptDir::new().with_script("greet.py", CLEAN_SCRIPT);
    let manager = open_manager(&dir, Duration::ZERO).await;
    let path = dir.path().join("greet.py");

    for _ in 0..3 {
        assert_eq!(
            manager.validate(&path).await.unwrap(),
            ValidationVerdict::Clean
        );
    }
    assert_eq!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::Allowed
    );
}

#[tokio::test]
async fn system_call_is_flagged_with_its_line() {
    let dir = ScriptDir::new()
        .with_script("risky.py", RISKY_SCRIPT)
        .with_script("decoy.py", DECOY_SCRIPT);
    let manager = open_manager(&dir, Duration::ZERO).await;

    let verdict = manager.validate(dir.path().join("risky.py")).await.unwrap();
    let reasons = verdict.reasons();
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].rule, "os.system");
    assert_eq!(reasons[0].line, 6);

    // Mentions inside comments and strings are not calls.
    assert!(
        manager
            .validate(dir.path().join("decoy.py"))
            .await
            .unwrap()
            .is_clean()
    );
}

#[tokio::test]
async fn cached_verdict_is_stable_until_source_changes() {
    let dir = ScriptDir::new().with_script("job.py", RISKY_SCRIPT);
    let manager = open_manager(&dir, Duration::ZERO).await;
    let path = dir.path().join("job.py");

    let first = manager.validate(&path).await.unwrap();
    let second = manager.validate(&path).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        manager.get_script(&path).await.unwrap().verdict,
        Some(first)
    );

    dir.write("job.py", CLEAN_SCRIPT);
    manager.reload().await;
    assert!(manager.get_script(&path).await.unwrap().verdict.is_none());
    assert!(manager.validate(&path).await.unwrap().is_clean());
}

#[tokio::test]
async fn flagged_script_needs_one_acknowledgment() {
    let dir = ScriptDir::new().with_script("risky.py", RISKY_SCRIPT);
    let manager = open_manager(&dir, Duration::ZERO).await;
    let path = dir.path().join("risky.py");

    assert!(matches!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::RequiresAcknowledgment { .. }
    ));
    assert!(matches!(
        manager.run(&path).await,
        Err(KernelError::NotAllowed { .. })
    ));

    manager.acknowledge(&path);
    assert_eq!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::Allowed
    );
    assert_eq!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::Allowed
    );
}

#[tokio::test]
async fn validated_flag_does_not_skip_the_prompt() {
    let dir = ScriptDir::new().with_script("reviewed.py", VALIDATED_RISKY_SCRIPT);
    let manager = open_manager(&dir, Duration::ZERO).await;
    let path = dir.path().join("reviewed.py");

    let entry = manager.get_script(&path).await.unwrap();
    assert!(entry.validated);

    match manager.request_execution(&path).await.unwrap() {
        GateDecision::RequiresAcknowledgment { reasons } => {
            assert_eq!(reasons[0].line, 6);
        },
        other => panic!("expected acknowledgment, got {other:?}"),
    }

    manager.acknowledge(&path);
    assert_eq!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::Allowed
    );
    // Still listed as flagged.
    assert!(!manager.validate(&path).await.unwrap().is_clean());
}

#[tokio::test]
async fn undecodable_script_is_blocked() {
    let dir = ScriptDir::new();
    dir.write("binary.py", [0xff_u8, 0xfe, 0x00, 0x81]);
    let manager = open_manager(&dir, Duration::ZERO).await;
    let path = dir.path().join("binary.py");

    let entry = manager.get_script(&path).await.unwrap();
    assert!(entry.parse_error.is_some());
    assert!(matches!(
        manager.request_execution(&path).await.unwrap(),
        GateDecision::Blocked { .. }
    ));

    // Acknowledgment does not unblock it.
    manager.acknowledge(&path);
    assert!(matches!(
        manager.run(&path).await,
        Err(KernelError::NotAllowed {
            decision: GateDecision::Blocked { .. },
            ..
        })
    ));
}
