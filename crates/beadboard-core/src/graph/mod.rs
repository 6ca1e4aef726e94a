//! Dependency query engine over an issue snapshot.
//!
//! Every function here is pure: it borrows the snapshot, never mutates it,
//! performs no I/O, and never fails. A `target_id` that does not resolve to
//! an issue in the snapshot is silently dropped from results.
//!
//! ## Submodules
//!
//! - [`blocking`]: blockers, blocked-by, related links, readiness, chains.
//! - [`hierarchy`]: parent/child edges, epics, grouped view, progress.
//! - [`cycles`]: cycle reporting for the `blocks` graph.
//! - [`order`]: display ordering.
//! - [`views`]: board columns and filtering.

pub mod blocking;
pub mod cycles;
pub mod hierarchy;
pub mod order;
pub mod views;

pub use blocking::{
    blocking_chain, get_blocked, get_blocked_issues, get_blockers, get_ready_issues_local,
    get_related, is_issue_ready,
};
pub use cycles::{CycleWarning, detect_cycle_on_add, find_all_cycles, has_cycles};
pub use hierarchy::{
    EpicGroup, EpicGrouping, EpicProgress, epic_progress, get_children, get_epics,
    get_issues_without_parent, get_parent, group_by_epic, resolved_parents,
};
pub use order::{display_order, issues_by_status, sort_issues};
pub use views::{Board, apply_filter, board};

use std::collections::HashMap;

use crate::model::{DependencyType, Issue};

/// The first issue in `all` whose id is `id`.
pub fn find_issue<'a>(id: &str, all: &'a [Issue]) -> Option<&'a Issue> {
    all.iter().find(|issue| issue.id == id)
}

/// Resolve every `dep_type` edge of `issue`, dropping dangling targets.
fn resolve_edges<'a>(issue: &Issue, dep_type: DependencyType, all: &'a [Issue]) -> Vec<&'a Issue> {
    issue
        .edge_targets(dep_type)
        .filter_map(|target| find_issue(target, all))
        .collect()
}

/// Id index over the snapshot. The first issue wins on duplicate ids, the
/// same rule [`find_issue`] applies.
fn index_by_id(all: &[Issue]) -> HashMap<&str, &Issue> {
    let mut map = HashMap::with_capacity(all.len());
    for issue in all {
        map.entry(issue.id.as_str()).or_insert(issue);
    }
    map
}
