use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use beadboard_core::sample::seed_if_empty;
use beadboard_core::store::{JsonFileStore, SnapshotStore};
use beadboard_core::{
    CreateIssueInput, Dependency, ErrorCode, IssueFilter, IssueTracker, LocalTracker,
    TrackerError,
};
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> JsonFileStore {
    JsonFileStore::new(dir.path().join(".beadboard/issues.json"))
}

#[test]
fn snapshot_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let tracker = LocalTracker::new(store_in(&dir));
    let a = tracker.create_issue(&CreateIssueInput::titled("a")).unwrap();
    let b = tracker.create_issue(&CreateIssueInput::titled("b")).unwrap();
    tracker
        .add_dependency(&b.id, &Dependency::blocks(&a.id))
        .unwrap();

    let reopened = LocalTracker::new(store_in(&dir));
    let all = reopened.list_issues(&IssueFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].dependencies, vec![Dependency::blocks(&a.id)]);
    assert_eq!(reopened.ready_issues().unwrap()[0].id, a.id);
}

#[test]
fn concurrent_creates_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let tracker = Arc::new(LocalTracker::new(
        store_in(&dir).with_lock_timeout(Duration::from_secs(10)),
    ));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                for n in 0..5 {
                    tracker
                        .create_issue(&CreateIssueInput::titled(format!("w{worker}-{n}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let all = tracker.list_issues(&IssueFilter::default()).unwrap();
    assert_eq!(all.len(), 20);
    let mut ids: Vec<_> = all.iter().map(|i| i.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[test]
fn corrupt_snapshot_fails_loudly_and_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(dir.path().join(".beadboard")).unwrap();
    fs::write(store.path(), "[{\"id\": ").unwrap();

    let tracker = LocalTracker::new(store);
    let err = tracker
        .create_issue(&CreateIssueInput::titled("x"))
        .unwrap_err();
    assert!(matches!(err, TrackerError::Json { .. }));
    assert_eq!(err.code(), ErrorCode::CorruptSnapshot);
    assert_eq!(
        fs::read_to_string(tracker.store().path()).unwrap(),
        "[{\"id\": "
    );
}

#[test]
fn sample_seeds_once_and_reads_back() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert!(seed_if_empty(&store).unwrap());
    assert!(!seed_if_empty(&store).unwrap());

    let issues = store.read().unwrap();
    assert_eq!(issues.len(), 6);
    let raw = fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"bd-k1l2\""));
    assert!(raw.contains("\"targetId\": \"bd-a1b2\""));
}

#[test]
fn clear_empties_the_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    seed_if_empty(&store).unwrap();
    store.clear().unwrap();
    assert!(store.exists());
    assert!(store.read().unwrap().is_empty());
}
