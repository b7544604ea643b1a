use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agent::{ConfigAgentClient, OperationStatusClient};
use crate::error::{BackupError, Result};
use crate::lro::{call_remote, fetch_operation_state, LroState};
use crate::request::build_physical_backup_request;
use crate::types::{Backup, BackupType, PhysicalBackupRequest};

/// Outcome of a successful status lookup.
#[derive(Debug)]
pub enum BackupProgress {
    Running,
    Succeeded,
    /// The operation is finished, and it finished with this error.
    Failed(BackupError),
}

impl BackupProgress {
    pub fn is_done(&self) -> bool {
        !matches!(self, BackupProgress::Running)
    }

    /// Splits into `(done, error)`. Done is true for both terminal outcomes.
    pub fn into_parts(self) -> (bool, Option<BackupError>) {
        match self {
            BackupProgress::Running => (false, None),
            BackupProgress::Succeeded => (true, None),
            BackupProgress::Failed(err) => (true, Some(err)),
        }
    }
}

/// Common contract of every backup strategy driven by the reconcile loop.
#[async_trait]
pub trait BackupStrategy: Send + Sync {
    /// Starts the backup and records its operation handle on `backup`.
    ///
    /// Each call issues exactly one start request. Callers that already hold
    /// a handle must not call this again for the same attempt.
    async fn create(&self, backup: &mut Backup, cancel: &CancellationToken) -> Result<()>;

    /// Reports progress of the operation recorded on `backup`.
    ///
    /// `Err` means the status could not be fetched and says nothing about
    /// the backup itself.
    async fn status(&self, backup: &Backup, cancel: &CancellationToken) -> Result<BackupProgress>;
}

/// Clients and limits shared by backups. Holds no per-backup state.
#[derive(Clone)]
pub struct BackupClients {
    pub agent: Arc<dyn ConfigAgentClient>,
    pub operations: Arc<dyn OperationStatusClient>,
    pub request_timeout: Duration,
}

impl BackupClients {
    pub fn new(
        agent: Arc<dyn ConfigAgentClient>,
        operations: Arc<dyn OperationStatusClient>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            agent,
            operations,
            request_timeout,
        }
    }
}

/// RMAN-style physical backup executed by the config agent.
pub struct PhysicalBackup {
    clients: BackupClients,
}

impl PhysicalBackup {
    pub fn new(clients: BackupClients) -> Self {
        Self { clients }
    }

    /// Builds the agent request, refusing backups of any other type.
    pub fn request_for(backup: &Backup) -> Result<PhysicalBackupRequest> {
        match backup.spec.backup_type {
            BackupType::Physical => Ok(build_physical_backup_request(&backup.spec)),
            other => Err(BackupError::UnsupportedBackupType(other)),
        }
    }
}

#[async_trait]
impl BackupStrategy for PhysicalBackup {
    async fn create(&self, backup: &mut Backup, cancel: &CancellationToken) -> Result<()> {
        let request = Self::request_for(backup)?;
        let instance = request.instance.clone();

        info!(
            backup = %backup.name,
            instance = %instance,
            dop = request.dop,
            backupset = request.backupset,
            level = request.level,
            gcs_path = %request.gcs_path,
            "starting physical backup"
        );

        let handle = call_remote(
            &instance,
            self.clients.request_timeout,
            cancel,
            self.clients.agent.start_physical_backup(&request),
        )
        .await?
        .map_err(|err| BackupError::agent(&instance, err))?;

        info!(backup = %backup.name, instance = %instance, handle = %handle, "physical backup started");
        backup.status.operation_handle = Some(handle);
        Ok(())
    }

    async fn status(&self, backup: &Backup, cancel: &CancellationToken) -> Result<BackupProgress> {
        let handle = backup
            .operation_handle()
            .ok_or_else(|| BackupError::MissingOperationHandle {
                backup: backup.name.clone(),
            })?;
        let instance = backup.spec.instance.as_str();

        let state = fetch_operation_state(
            self.clients.operations.as_ref(),
            handle,
            instance,
            self.clients.request_timeout,
            cancel,
        )
        .await?;

        Ok(match state {
            LroState::Running => BackupProgress::Running,
            LroState::Succeeded => BackupProgress::Succeeded,
            LroState::Failed(err) => BackupProgress::Failed(BackupError::OperationFailed {
                handle: handle.to_string(),
                instance: instance.to_string(),
                code: err.code,
                message: err.message,
            }),
        })
    }
}

/// Picks the strategy matching the backup's type.
pub fn strategy_for(backup: &Backup, clients: &BackupClients) -> Result<Box<dyn BackupStrategy>> {
    match backup.spec.backup_type {
        BackupType::Physical => Ok(Box::new(PhysicalBackup::new(clients.clone()))),
        other => Err(BackupError::UnsupportedBackupType(other)),
    }
}
