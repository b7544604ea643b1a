use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackupType {
    #[default]
    Physical,
    Snapshot,
}

impl std::fmt::Display for BackupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupType::Physical => write!(f, "Physical"),
            BackupType::Snapshot => write!(f, "Snapshot"),
        }
    }
}

/// Desired state of a backup as declared by the user.
///
/// Zero values and absent optionals are resolved by
/// [`build_physical_backup_request`](crate::request::build_physical_backup_request),
/// never here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSpec {
    pub instance: String,
    #[serde(rename = "type", default)]
    pub backup_type: BackupType,
    /// Degree of parallelism. Zero means "use the default".
    #[serde(default)]
    pub dop: i32,
    /// `None` is distinct from `Some(false)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backupset: Option<bool>,
    #[serde(default)]
    pub gcs_path: String,
    /// Incremental level, 0 is a full backup.
    #[serde(default)]
    pub level: i32,
}

/// Fully resolved request sent to the config agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalBackupRequest {
    pub instance: String,
    pub dop: i32,
    pub backupset: bool,
    pub gcs_path: String,
    pub level: i32,
}

/// Raw long-running operation as reported by the status service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackupPhase {
    #[default]
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl BackupPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BackupPhase::Succeeded | BackupPhase::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    #[serde(default)]
    pub phase: BackupPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The backup resource handed to the engine by the reconcile loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    pub spec: BackupSpec,
    #[serde(default)]
    pub status: BackupStatus,
}

impl Backup {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, spec: BackupSpec) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            spec,
            status: BackupStatus::default(),
        }
    }

    pub fn operation_handle(&self) -> Option<&str> {
        self.status
            .operation_handle
            .as_deref()
            .filter(|handle| !handle.is_empty())
    }
}
