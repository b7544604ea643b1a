use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backup::{strategy_for, BackupClients, BackupProgress};
use crate::error::{BackupError, Result};
use crate::lro::delete_operation;
use crate::types::{Backup, BackupPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Requeue(Duration),
    Done,
}

/// Drives a single backup resource one step at a time.
///
/// Mirrors what a controller does on each reconcile: start the backup when
/// no handle is recorded, otherwise poll it and record the terminal phase.
pub struct BackupReconciler {
    clients: BackupClients,
    poll_interval: Duration,
    delete_operation_on_completion: bool,
}

impl BackupReconciler {
    pub fn new(clients: BackupClients, poll_interval: Duration) -> Self {
        Self {
            clients,
            poll_interval,
            delete_operation_on_completion: true,
        }
    }

    pub fn with_operation_cleanup(mut self, enabled: bool) -> Self {
        self.delete_operation_on_completion = enabled;
        self
    }

    pub async fn reconcile(
        &self,
        backup: &mut Backup,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction> {
        if backup.status.phase.is_terminal() {
            return Ok(ReconcileAction::Done);
        }

        let strategy = strategy_for(backup, &self.clients)?;

        if backup.operation_handle().is_none() {
            strategy.create(backup, cancel).await?;
            backup.status.phase = BackupPhase::InProgress;
            backup.status.start_time = Some(Utc::now());
            backup.status.message = None;
            return Ok(ReconcileAction::Requeue(self.poll_interval));
        }

        let progress = strategy.status(backup, cancel).await?;
        let (phase, message) = match progress {
            BackupProgress::Running => {
                debug!(backup = %backup.name, "backup still running");
                return Ok(ReconcileAction::Requeue(self.poll_interval));
            }
            BackupProgress::Succeeded => (BackupPhase::Succeeded, None),
            BackupProgress::Failed(err) => (BackupPhase::Failed, Some(err.to_string())),
        };

        info!(backup = %backup.name, ?phase, message = message.as_deref().unwrap_or(""), "backup finished");
        backup.status.phase = phase;
        backup.status.completion_time = Some(Utc::now());
        backup.status.message = message;

        if self.delete_operation_on_completion {
            self.cleanup(backup, cancel).await;
        }
        Ok(ReconcileAction::Done)
    }

    /// Best-effort removal of the finished operation. Never changes the phase.
    async fn cleanup(&self, backup: &Backup, cancel: &CancellationToken) {
        let Some(handle) = backup.operation_handle() else {
            return;
        };
        if let Err(err) = delete_operation(
            self.clients.agent.as_ref(),
            handle,
            &backup.spec.instance,
            self.clients.request_timeout,
            cancel,
        )
        .await
        {
            warn!(backup = %backup.name, error = %err, "operation cleanup failed");
        }
    }

    /// Reconciles until the backup reaches a terminal phase.
    ///
    /// Errors are returned to the caller on first occurrence. No retry.
    pub async fn run_to_completion(
        &self,
        backup: &mut Backup,
        cancel: &CancellationToken,
    ) -> Result<()> {
        loop {
            match self.reconcile(backup, cancel).await? {
                ReconcileAction::Done => return Ok(()),
                ReconcileAction::Requeue(after) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(BackupError::Cancelled {
                                instance: backup.spec.instance.clone(),
                            });
                        }
                        _ = tokio::time::sleep(after) => {}
                    }
                }
            }
        }
    }
}
