//! Blocking and related edges: resolution, readiness, and blocking chains.
//!
//! # Scheduling semantics
//!
//! An issue is **ready** when its status is `open` and every `blocks` edge
//! that still resolves to an issue in the snapshot points at a `closed`
//! issue. A `blocks` edge whose target is missing from the snapshot
//! (deleted, never synced, mistyped) has no blocking effect: dangling
//! references are permissive.
//!
//! An issue is **blocked** (for board purposes) when it is `open` but not
//! ready. Issues in `in_progress`, `blocked` or `closed` status are neither.
//!
//! # Related semantics
//!
//! `related` edges are informational and never affect readiness.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
)]

use std::collections::{HashSet, VecDeque};

use super::{index_by_id, resolve_edges};
use crate::model::{DependencyType, Issue};

/// Issues referenced by `issue`'s `blocks` edges, in declaration order.
///
/// Edges whose target is not in `all` are skipped.
pub fn get_blockers<'a>(issue: &Issue, all: &'a [Issue]) -> Vec<&'a Issue> {
    resolve_edges(issue, DependencyType::Blocks, all)
}

/// Issues that declare a `blocks` edge targeting `issue_id`, in snapshot order.
pub fn get_blocked<'a>(issue_id: &str, all: &'a [Issue]) -> Vec<&'a Issue> {
    all.iter()
        .filter(|candidate| candidate.has_edge(DependencyType::Blocks, issue_id))
        .collect()
}

/// Issues referenced by `issue`'s `related` edges, in declaration order.
pub fn get_related<'a>(issue: &Issue, all: &'a [Issue]) -> Vec<&'a Issue> {
    resolve_edges(issue, DependencyType::Related, all)
}

/// Returns `true` if `issue` is open and no resolvable blocker is still
/// unfinished.
pub fn is_issue_ready(issue: &Issue, all: &[Issue]) -> bool {
    if !issue.is_open() {
        return false;
    }
    get_blockers(issue, all)
        .into_iter()
        .all(|blocker| blocker.status.is_terminal())
}

/// Open issues that are not ready, in snapshot order.
pub fn get_blocked_issues(all: &[Issue]) -> Vec<&Issue> {
    all.iter()
        .filter(|issue| issue.is_open() && !is_issue_ready(issue, all))
        .collect()
}

/// Every ready issue, in snapshot order.
pub fn get_ready_issues_local(all: &[Issue]) -> Vec<&Issue> {
    all.iter().filter(|issue| is_issue_ready(issue, all)).collect()
}

/// Transitive blockers of `issue` in breadth-first discovery order.
///
/// Each issue appears at most once and `issue` itself never appears, so
/// blocking cycles terminate. Dangling edges are skipped like everywhere
/// else. Closed blockers are included; callers filter if they only want
/// the outstanding part of the chain.
pub fn blocking_chain<'a>(issue: &Issue, all: &'a [Issue]) -> Vec<&'a Issue> {
    let by_id = index_by_id(all);
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(issue.id.as_str());

    let mut chain = Vec::new();
    let mut queue: VecDeque<&'a Issue> = get_blockers(issue, all).into_iter().collect();

    while let Some(next) = queue.pop_front() {
        if !seen.insert(next.id.as_str()) {
            continue;
        }
        chain.push(next);
        for target in next.edge_targets(DependencyType::Blocks) {
            if seen.contains(target) {
                continue;
            }
            if let Some(&blocker) = by_id.get(target) {
                queue.push_back(blocker);
            }
        }
    }

    chain
}
