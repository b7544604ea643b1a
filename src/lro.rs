//! Long-running operation helpers shared by every backup strategy.
//!
//! Fetching an operation and classifying it are kept apart: a failed lookup
//! is reported through `Err`, while an operation that finished with an error
//! is a successful lookup classified as [`LroState::Failed`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::agent::{ConfigAgentClient, OperationStatusClient};
use crate::error::{BackupError, Result};
use crate::types::{Operation, OperationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LroState {
    Running,
    Succeeded,
    Failed(OperationError),
}

impl LroState {
    pub fn is_done(&self) -> bool {
        !matches!(self, LroState::Running)
    }
}

/// An operation reported as not done while already carrying an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("operation is not done but reports error {}: {}", .0.code, .0.message)]
pub struct InconsistentOperation(pub OperationError);

/// Maps a raw operation onto its state.
///
/// An operation that is not done yet carries an error is rejected instead of
/// being treated as running.
pub fn classify(operation: &Operation) -> std::result::Result<LroState, InconsistentOperation> {
    match (operation.done, &operation.error) {
        (false, None) => Ok(LroState::Running),
        (true, None) => Ok(LroState::Succeeded),
        (true, Some(err)) => Ok(LroState::Failed(err.clone())),
        (false, Some(err)) => Err(InconsistentOperation(err.clone())),
    }
}

/// Runs one remote call, aborting it on cancellation or once `timeout` elapses.
///
/// The outer `Result` carries cancellation and deadline failures, the inner
/// one whatever the client returned.
pub(crate) async fn call_remote<T, F>(
    instance: &str,
    timeout: Duration,
    cancel: &CancellationToken,
    call: F,
) -> Result<anyhow::Result<T>>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BackupError::Cancelled {
            instance: instance.to_string(),
        }),
        outcome = tokio::time::timeout(timeout, call) => {
            outcome.map_err(|_| BackupError::DeadlineExceeded {
                instance: instance.to_string(),
                timeout,
            })
        }
    }
}

/// Fetches and classifies the operation behind `handle`.
pub async fn fetch_operation_state(
    client: &dyn OperationStatusClient,
    handle: &str,
    instance: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<LroState> {
    let operation = call_remote(instance, timeout, cancel, client.get_operation(handle))
        .await?
        .map_err(|err| BackupError::lookup(handle, instance, err))?;

    let state = classify(&operation).map_err(|InconsistentOperation(err)| {
        BackupError::ProtocolViolation {
            handle: handle.to_string(),
            instance: instance.to_string(),
            code: err.code,
            message: err.message,
        }
    })?;
    debug!(handle, instance, ?state, "fetched operation");
    Ok(state)
}

/// Releases the remote bookkeeping for a finished operation.
pub async fn delete_operation(
    client: &dyn ConfigAgentClient,
    handle: &str,
    instance: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    call_remote(instance, timeout, cancel, client.delete_operation(handle))
        .await?
        .map_err(|err| BackupError::delete(handle, instance, err))
}
