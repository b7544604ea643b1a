use anyhow::anyhow;
use backup_lro_crab::agent::{MockConfigAgentClient, MockOperationStatusClient};
use backup_lro_crab::lro::{
    classify, delete_operation, fetch_operation_state, InconsistentOperation, LroState,
};
use backup_lro_crab::types::{Operation, OperationError};
use backup_lro_crab::BackupError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn operation(done: bool, error: Option<(i32, &str)>) -> Operation {
    Operation {
        name: "operations/op-1".to_string(),
        done,
        error: error.map(|(code, message)| OperationError {
            code,
            message: message.to_string(),
        }),
    }
}

#[test]
fn test_classify_valid_states() {
    assert_eq!(classify(&operation(false, None)).unwrap(), LroState::Running);
    assert_eq!(classify(&operation(true, None)).unwrap(), LroState::Succeeded);
    assert_eq!(
        classify(&operation(true, Some((13, "boom")))).unwrap(),
        LroState::Failed(OperationError {
            code: 13,
            message: "boom".to_string()
        })
    );
}

#[test]
fn test_classify_not_done_with_error_is_rejected() {
    let err = classify(&operation(false, Some((2, "odd")))).unwrap_err();
    assert_eq!(
        err,
        InconsistentOperation(OperationError {
            code: 2,
            message: "odd".to_string()
        })
    );
}

#[test]
fn test_classify_is_repeatable() {
    for op in [
        operation(false, None),
        operation(true, None),
        operation(true, Some((1, "x"))),
    ] {
        assert_eq!(classify(&op).unwrap(), classify(&op).unwrap());
    }
}

#[test]
fn test_done_only_for_terminal_states() {
    assert!(!LroState::Running.is_done());
    assert!(LroState::Succeeded.is_done());
    assert!(LroState::Failed(OperationError::default()).is_done());
}

#[test]
fn test_operation_wire_format() {
    let doc = r#"{"name":"operations/op-1","done":true,"error":{"code":13,"message":"boom"}}"#;
    let op: Operation = serde_json::from_str(doc).unwrap();
    assert_eq!(op, operation(true, Some((13, "boom"))));

    let running: Operation = serde_json::from_str(r#"{"name":"operations/op-1"}"#).unwrap();
    assert_eq!(classify(&running).unwrap(), LroState::Running);
}

#[tokio::test]
async fn test_fetch_operation_state() {
    let mut client = MockOperationStatusClient::new();
    client
        .expect_get_operation()
        .withf(|handle| handle == "operations/op-1")
        .times(1)
        .returning(|_| Ok(operation(true, None)));

    let state = fetch_operation_state(
        &client,
        "operations/op-1",
        "db1",
        Duration::from_secs(1),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(state, LroState::Succeeded);
}

#[tokio::test]
async fn test_fetch_operation_state_lookup_error() {
    let mut client = MockOperationStatusClient::new();
    client
        .expect_get_operation()
        .times(1)
        .returning(|_| Err(anyhow!("not found")));

    let err = fetch_operation_state(
        &client,
        "operations/op-1",
        "db1",
        Duration::from_secs(1),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BackupError::OperationLookup { .. }));
    assert!(err.to_string().contains("db1"));
}

#[tokio::test]
async fn test_delete_operation_reports_failure() {
    let mut agent = MockConfigAgentClient::new();
    agent
        .expect_delete_operation()
        .withf(|handle| handle == "operations/op-1")
        .times(1)
        .returning(|_| Err(anyhow!("gone")));

    let err = delete_operation(
        &agent,
        "operations/op-1",
        "db1",
        Duration::from_secs(1),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BackupError::DeleteOperation { .. }));
    assert!(!err.is_terminal());
}

#[tokio::test]
async fn test_fetch_inconsistent_operation_without_name_keeps_context() {
    let mut client = MockOperationStatusClient::new();
    client.expect_get_operation().times(1).returning(|_| {
        Ok(Operation {
            name: String::new(),
            done: false,
            error: Some(OperationError {
                code: 2,
                message: "odd".to_string(),
            }),
        })
    });

    let err = fetch_operation_state(
        &client,
        "operations/op-9",
        "db1",
        Duration::from_secs(1),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    match &err {
        BackupError::ProtocolViolation { handle, instance, code, message } => {
            assert_eq!(handle, "operations/op-9");
            assert_eq!(instance, "db1");
            assert_eq!(*code, 2);
            assert_eq!(message, "odd");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let text = err.to_string();
    assert!(text.contains("operations/op-9"));
    assert!(text.contains("db1"));
}
