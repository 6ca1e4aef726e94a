//! End-to-end query scenarios over small hand-built snapshots.

use beadboard_core::graph::{
    blocking_chain, board, epic_progress, find_all_cycles, get_blocked, get_blocked_issues,
    get_blockers, get_children, get_epics, get_issues_without_parent, get_parent,
    get_ready_issues_local, group_by_epic, is_issue_ready, sort_issues,
};
use beadboard_core::store::MemoryStore;
use beadboard_core::{
    CreateIssueInput, Dependency, Issue, IssueStatus, IssueTracker, IssueType, LocalTracker,
    Priority, UpdateIssueInput, ready_issues_or_local,
};
use chrono::{DateTime, TimeZone, Utc};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn ids(issues: &[&Issue]) -> Vec<String> {
    issues.iter().map(|i| i.id.clone()).collect()
}

#[test]
fn blocked_issue_waits_on_open_blocker() {
    let all = vec![
        Issue::new("A", "a", at(0)),
        Issue::new("B", "b", at(0)).with_dependency(Dependency::blocks("A")),
        Issue::new("C", "c", at(0)).with_status(IssueStatus::Closed),
    ];

    assert_eq!(ids(&get_ready_issues_local(&all)), vec!["A"]);
    assert_eq!(ids(&get_blocked_issues(&all)), vec!["B"]);
    assert_eq!(ids(&get_blockers(&all[1], &all)), vec!["A"]);
    assert_eq!(ids(&get_blocked("A", &all)), vec!["B"]);
}

#[test]
fn epic_grouping_buckets_children_and_orphans() {
    let all = vec![
        Issue::new("Epic", "epic", at(0)).with_type(IssueType::Epic),
        Issue::new("T1", "t1", at(0)).with_dependency(Dependency::parent("Epic")),
        Issue::new("T2", "t2", at(0)),
    ];

    assert_eq!(ids(&get_epics(&all)), vec!["Epic"]);
    assert_eq!(ids(&get_children("Epic", &all)), vec!["T1"]);
    assert_eq!(ids(&get_issues_without_parent(&all)), vec!["T2"]);
    assert_eq!(get_parent(&all[1], &all).map(|p| p.id.as_str()), Some("Epic"));

    let grouping = group_by_epic(&all);
    assert_eq!(grouping.groups.len(), 1);
    assert_eq!(ids(&grouping.groups[0].children), vec!["T1"]);
    assert_eq!(ids(&grouping.unassigned), vec!["T2"]);
}

#[test]
fn sort_breaks_priority_ties_by_recency() {
    let p = |n| Priority::new(n).unwrap();
    let all = vec![
        Issue::new("p2", "x", at(0)).with_priority(p(2)),
        Issue::new("p0", "x", at(0)).with_priority(p(0)),
        Issue::new("p1-old", "x", at(0)).with_priority(p(1)).with_updated_at(at(10)),
        Issue::new("p1-new", "x", at(0)).with_priority(p(1)).with_updated_at(at(20)),
    ];
    assert_eq!(
        ids(&sort_issues(&all)),
        vec!["p0", "p1-new", "p1-old", "p2"]
    );
}

#[test]
fn first_parent_edge_wins_and_dangling_parent_resolves_to_none() {
    let all = vec![
        Issue::new("E1", "e1", at(0)).with_type(IssueType::Epic),
        Issue::new("E2", "e2", at(0)).with_type(IssueType::Epic),
        Issue::new("T", "t", at(0))
            .with_dependency(Dependency::parent("E2"))
            .with_dependency(Dependency::parent("E1")),
        Issue::new("Orphan", "o", at(0)).with_dependency(Dependency::parent("E-deleted")),
    ];

    assert_eq!(get_parent(&all[2], &all).map(|p| p.id.as_str()), Some("E2"));
    assert!(get_parent(&all[3], &all).is_none());
    // Edge presence still counts as "has a parent" for the unassigned bucket.
    assert!(get_issues_without_parent(&all).is_empty());
}

#[test]
fn closing_the_chain_releases_issues_in_order() {
    let all = vec![
        Issue::new("deploy", "deploy", at(0))
            .with_dependency(Dependency::blocks("test")),
        Issue::new("test", "test", at(0)).with_dependency(Dependency::blocks("build")),
        Issue::new("build", "build", at(0)),
    ];
    assert_eq!(ids(&blocking_chain(&all[0], &all)), vec!["test", "build"]);
    assert_eq!(ids(&get_ready_issues_local(&all)), vec!["build"]);

    let mut next = all.clone();
    next[2].status = IssueStatus::Closed;
    assert_eq!(ids(&get_ready_issues_local(&next)), vec!["test"]);
    assert!(!is_issue_ready(&next[0], &next));
}

#[test]
fn blocking_cycle_is_reported_not_fatal() {
    let all = vec![
        Issue::new("X", "x", at(0)).with_dependency(Dependency::blocks("Y")),
        Issue::new("Y", "y", at(0)).with_dependency(Dependency::blocks("X")),
    ];
    assert!(get_ready_issues_local(&all).is_empty());
    assert_eq!(ids(&get_blocked_issues(&all)), vec!["X", "Y"]);

    let cycles = find_all_cycles(&all);
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].is_mutual_block());
    assert_eq!(blocking_chain(&all[0], &all).len(), 1);
}

#[test]
fn local_tracker_round_trip_drives_the_board() {
    let tracker = LocalTracker::new(MemoryStore::new());

    let mut epic = CreateIssueInput::titled("Real-time collaboration");
    epic.issue_type = Some(IssueType::Epic);
    let epic = tracker.create_issue(&epic).unwrap();
    let auth = tracker
        .create_issue(&CreateIssueInput::titled("Authentication"))
        .unwrap();
    let socket = tracker
        .create_issue(&CreateIssueInput::titled("WebSocket server"))
        .unwrap();

    tracker
        .add_dependency(&socket.id, &Dependency::parent(&epic.id))
        .unwrap();
    tracker
        .add_dependency(&socket.id, &Dependency::blocks(&auth.id))
        .unwrap();

    let ready = ready_issues_or_local(&tracker).unwrap();
    assert!(ready.iter().all(|i| i.id != socket.id));

    tracker
        .update_issue(&auth.id, &UpdateIssueInput::status(IssueStatus::InProgress))
        .unwrap();
    tracker.close_issue(&auth.id).unwrap();

    let snapshot = tracker.list_issues(&Default::default()).unwrap();
    let view = board(&snapshot);
    assert_eq!(ids(&view.closed), vec![auth.id.clone()]);
    assert!(ids(&view.ready).contains(&socket.id));

    tracker.close_issue(&socket.id).unwrap();
    let snapshot = tracker.list_issues(&Default::default()).unwrap();
    let progress = epic_progress(&epic.id, &snapshot);
    assert_eq!((progress.done, progress.total), (1, 1));
    assert!(progress.is_complete());
}

/// `bd-0` waits on `bd-1`, which waits on `bd-2`, and so on.
fn blocks_chain(len: usize) -> Vec<Issue> {
    (0..len)
        .map(|i| {
            let issue = Issue::new(format!("bd-{i}"), format!("step {i}"), at(0));
            if i + 1 < len {
                issue.with_dependency(Dependency::blocks(format!("bd-{}", i + 1)))
            } else {
                issue
            }
        })
        .collect()
}

#[test]
fn deep_blocks_chain_is_walked_without_recursion() {
    let len = 50_000;
    let mut all = blocks_chain(len);
    assert!(find_all_cycles(&all).is_empty());
    assert_eq!(blocking_chain(&all[0], &all).len(), len - 1);

    // Close the loop: the tail now waits on the head.
    all[len - 1].dependencies.push(Dependency::blocks("bd-0"));
    let cycles = find_all_cycles(&all);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].cycle_len(), len);
    assert_eq!(cycles[0].edge_from, format!("bd-{}", len - 1));
    assert_eq!(cycles[0].edge_to, "bd-0");
}
