use super::*;
use conductor_core::ManifestLoadOutcome;
use std::path::PathBuf;

#[test]
fn records_accumulate_in_order() {
    let sink = InMemoryAuditSink::new();
    sink.record(ManifestLoadRecord {
        module_dir: PathBuf::from("/extensions/a"),
        outcome: ManifestLoadOutcome::Loaded,
        diagnostics: vec![],
    });
    sink.record(ManifestLoadRecord {
        module_dir: PathBuf::from("/extensions/b"),
        outcome: ManifestLoadOutcome::InvalidManifest,
        diagnostics: vec!["missing name field".into()],
    });

    let all = sink.all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].outcome, ManifestLoadOutcome::InvalidManifest);
}
