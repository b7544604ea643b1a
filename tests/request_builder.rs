use backup_lro_crab::build_physical_backup_request;
use backup_lro_crab::types::{BackupSpec, BackupType, PhysicalBackupRequest};

fn spec(instance: &str) -> BackupSpec {
    BackupSpec {
        instance: instance.to_string(),
        backup_type: BackupType::Physical,
        ..Default::default()
    }
}

#[test]
fn test_defaults_for_empty_spec() {
    let request = build_physical_backup_request(&spec("db1"));

    assert_eq!(
        request,
        PhysicalBackupRequest {
            instance: "db1".to_string(),
            dop: 1,
            backupset: true,
            gcs_path: String::new(),
            level: 0,
        }
    );
}

#[test]
fn test_dop_passes_through_when_set() {
    for dop in [1, 2, 5, 64] {
        let request = build_physical_backup_request(&BackupSpec { dop, ..spec("db1") });
        assert_eq!(request.dop, dop);
    }
}

#[test]
fn test_negative_dop_is_not_validated() {
    let request = build_physical_backup_request(&BackupSpec { dop: -3, ..spec("db1") });
    assert_eq!(request.dop, -3);
}

#[test]
fn test_backupset_tri_state() {
    let unset = build_physical_backup_request(&spec("db1"));
    let explicit_false =
        build_physical_backup_request(&BackupSpec { backupset: Some(false), ..spec("db1") });
    let explicit_true =
        build_physical_backup_request(&BackupSpec { backupset: Some(true), ..spec("db1") });

    assert!(unset.backupset);
    assert!(!explicit_false.backupset);
    assert!(explicit_true.backupset);
    assert_eq!(explicit_false.dop, 1);
}

#[test]
fn test_gcs_path_and_level_pass_through() {
    let request = build_physical_backup_request(&BackupSpec {
        gcs_path: "gs://bucket/x".to_string(),
        level: 1,
        ..spec("db1")
    });

    assert_eq!(request.gcs_path, "gs://bucket/x");
    assert_eq!(request.level, 1);
    assert_eq!(request.dop, 1);
    assert!(request.backupset);
}

#[test]
fn test_spec_document_defaults() {
    let doc = r#"{"instance": "db1", "type": "Physical", "dop": 5}"#;
    let spec: BackupSpec = serde_json::from_str(doc).unwrap();

    assert_eq!(spec.backupset, None);
    let request = build_physical_backup_request(&spec);
    assert_eq!(request.dop, 5);
    assert!(request.backupset);
    assert_eq!(request.level, 0);
    assert_eq!(request.gcs_path, "");

    let doc = r#"{"instance": "db1", "backupset": false, "gcsPath": "gs://b"}"#;
    let spec: BackupSpec = serde_json::from_str(doc).unwrap();
    assert_eq!(spec.backupset, Some(false));
    assert_eq!(spec.gcs_path, "gs://b");
}
