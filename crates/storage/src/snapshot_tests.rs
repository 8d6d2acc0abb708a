use super::*;
use conductor_core::test_support::queued_job;
use tempfile::tempdir;

#[test]
fn load_returns_none_when_file_absent() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("orchestrator-jobs.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("orchestrator-jobs.json"));
    let snapshot = QueueSnapshot::new(vec![queued_job("proj-1", "demo.job")]);
    store.save(&snapshot).unwrap();

    let loaded = store.load().unwrap().expect("snapshot should exist");
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.jobs.len(), 1);
    assert_eq!(loaded.jobs[0].project_id, "proj-1");
}

#[test]
fn repeated_saves_rotate_backups_and_cap_at_three() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("orchestrator-jobs.json");
    let store = SnapshotStore::new(&path);

    for i in 0..5 {
        let snapshot = QueueSnapshot::new(vec![queued_job("proj-1", &format!("job-{i}"))]);
        store.save(&snapshot).unwrap();
    }

    assert!(path.with_extension("bak").exists());
    assert!(path.with_extension("bak.2").exists());
    assert!(path.with_extension("bak.3").exists());
    assert!(!path.with_extension("bak.4").exists());

    // Most recent save always wins in the live file.
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.jobs[0].job_type, "job-4");
}

#[test]
fn rejects_snapshot_with_future_schema_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("orchestrator-jobs.json");
    std::fs::write(&path, serde_json::json!({"version": 99, "jobs": []}).to_string()).unwrap();

    let store = SnapshotStore::new(&path);
    let err = store.load().unwrap_err();
    assert!(matches!(err, SnapshotError::UnsupportedVersion { found: 99, .. }));
}
