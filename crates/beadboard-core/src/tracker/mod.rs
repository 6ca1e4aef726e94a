//! Tracker backends: where issues live and how they change.
//!
//! The query engine only reads snapshots. Everything that creates, edits or
//! deletes issues goes through an [`IssueTracker`]:
//!
//! - [`LocalTracker`] keeps the snapshot in a [`SnapshotStore`](crate::store::SnapshotStore).
//! - [`BdBridge`] shells out to the `bd` command and maps its JSON output.
//!
//! Every call is synchronous and fallible. Callers re-read the full snapshot
//! after a mutation and re-derive their views from scratch.

mod bridge;
mod local;
mod wire;

pub use bridge::{BdBridge, DEFAULT_BD_PROGRAM};
pub use local::{LocalTracker, MAX_ID_ATTEMPTS};

use tracing::warn;

use crate::error::TrackerError;
use crate::graph::{get_ready_issues_local, sort_issues};
use crate::model::{
    CreateIssueInput, Dependency, Issue, IssueFilter, IssueStatus, UpdateIssueInput,
};

/// The persistence contract shared by every backend.
pub trait IssueTracker {
    /// Short backend name for logs and error messages.
    fn backend_name(&self) -> &'static str;

    /// The snapshot, narrowed by `filter`. An empty filter returns everything.
    fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, TrackerError>;

    fn get_issue(&self, id: &str) -> Result<Issue, TrackerError>;

    fn create_issue(&self, input: &CreateIssueInput) -> Result<Issue, TrackerError>;

    /// Apply the `Some` fields of `update` and bump `updated_at`.
    fn update_issue(&self, id: &str, update: &UpdateIssueInput) -> Result<Issue, TrackerError>;

    fn close_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        self.update_issue(id, &UpdateIssueInput::status(IssueStatus::Closed))
    }

    fn delete_issue(&self, id: &str) -> Result<(), TrackerError>;

    /// Add an edge declared by `id`. Adding an existing edge is a no-op.
    fn add_dependency(&self, id: &str, dependency: &Dependency) -> Result<(), TrackerError>;

    /// Drop every edge from `id` to `target_id`, whatever its type.
    fn remove_dependency(&self, id: &str, target_id: &str) -> Result<(), TrackerError>;

    /// Backend-computed ready list. Backends without one return
    /// [`TrackerError::Unsupported`]; see [`ready_issues_or_local`].
    fn ready_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        Err(TrackerError::Unsupported {
            backend: self.backend_name(),
            operation: "ready_issues",
        })
    }
}

/// Ready issues from the backend, or computed locally if the backend can't.
///
/// Any error from [`IssueTracker::ready_issues`] is logged and replaced by
/// [`get_ready_issues_local`] over the full snapshot, in display order.
/// Errors from the fallback itself are returned.
pub fn ready_issues_or_local<T>(tracker: &T) -> Result<Vec<Issue>, TrackerError>
where
    T: IssueTracker + ?Sized,
{
    match tracker.ready_issues() {
        Ok(issues) => Ok(issues),
        Err(err) => {
            warn!(
                backend = tracker.backend_name(),
                error = %err,
                "ready query failed; computing readiness locally"
            );
            let all = tracker.list_issues(&IssueFilter::default())?;
            Ok(sort_issues(get_ready_issues_local(&all))
                .into_iter()
                .cloned()
                .collect())
        }
    }
}
