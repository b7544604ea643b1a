use std::time::Duration;

use thiserror::Error;

use crate::types::BackupType;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("failed to start physical backup for instance {instance}: {source}")]
    Agent {
        instance: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to fetch operation {handle} for instance {instance}: {source}")]
    OperationLookup {
        handle: String,
        instance: String,
        #[source]
        source: BoxError,
    },

    #[error("operation {handle} for instance {instance} failed with code {code}: {message}")]
    OperationFailed {
        handle: String,
        instance: String,
        code: i32,
        message: String,
    },

    #[error("operation {handle} for instance {instance} is not done but reports error {code}: {message}")]
    ProtocolViolation {
        handle: String,
        instance: String,
        code: i32,
        message: String,
    },

    #[error("failed to delete operation {handle} for instance {instance}: {source}")]
    DeleteOperation {
        handle: String,
        instance: String,
        #[source]
        source: BoxError,
    },

    #[error("backup {backup} has no operation handle")]
    MissingOperationHandle { backup: String },

    #[error("backup type {0} is not supported by this engine")]
    UnsupportedBackupType(BackupType),

    #[error("request for instance {instance} was cancelled")]
    Cancelled { instance: String },

    #[error("request for instance {instance} exceeded deadline of {timeout:?}")]
    DeadlineExceeded { instance: String, timeout: Duration },

    #[error("configuration error: {0}")]
    Config(String),
}

impl BackupError {
    pub(crate) fn agent(instance: &str, err: anyhow::Error) -> Self {
        BackupError::Agent {
            instance: instance.to_string(),
            source: err.into(),
        }
    }

    pub(crate) fn lookup(handle: &str, instance: &str, err: anyhow::Error) -> Self {
        BackupError::OperationLookup {
            handle: handle.to_string(),
            instance: instance.to_string(),
            source: err.into(),
        }
    }

    pub(crate) fn delete(handle: &str, instance: &str, err: anyhow::Error) -> Self {
        BackupError::DeleteOperation {
            handle: handle.to_string(),
            instance: instance.to_string(),
            source: err.into(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            BackupError::Cancelled { .. } | BackupError::DeadlineExceeded { .. }
        )
    }

    /// True when the remote operation itself finished unsuccessfully.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BackupError::OperationFailed { .. })
    }

    /// True for failures a later reconcile attempt may clear.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackupError::Agent { .. }
                | BackupError::OperationLookup { .. }
                | BackupError::DeleteOperation { .. }
        ) || self.is_cancellation()
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
