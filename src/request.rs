use crate::types::{BackupSpec, PhysicalBackupRequest};

const DEFAULT_DOP: i32 = 1;
const DEFAULT_BACKUPSET: bool = true;

/// Resolves a backup spec into the request sent to the config agent.
///
/// `dop` of zero becomes 1 and an absent `backupset` becomes `true`.
/// Everything else passes through, zero values included. No validation
/// happens here: a negative `dop` is forwarded as-is.
pub fn build_physical_backup_request(spec: &BackupSpec) -> PhysicalBackupRequest {
    let dop = if spec.dop == 0 { DEFAULT_DOP } else { spec.dop };

    PhysicalBackupRequest {
        instance: spec.instance.clone(),
        dop,
        backupset: spec.backupset.unwrap_or(DEFAULT_BACKUPSET),
        gcs_path: spec.gcs_path.clone(),
        level: spec.level,
    }
}
