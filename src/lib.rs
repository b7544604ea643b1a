pub mod agent;
pub mod backup;
pub mod config;
pub mod error;
pub mod lro;
pub mod reconcile;
pub mod request;
pub mod types;

pub use backup::{strategy_for, BackupClients, BackupProgress, BackupStrategy, PhysicalBackup};
pub use error::{BackupError, Result};
pub use reconcile::{BackupReconciler, ReconcileAction};
pub use request::build_physical_backup_request;
