use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};

use super::IssueTracker;
use crate::error::TrackerError;
use crate::graph::{apply_filter, detect_cycle_on_add, get_ready_issues_local, sort_issues};
use crate::id::generate_issue_id_with;
use crate::model::{
    CreateIssueInput, Dependency, DependencyType, Issue, IssueFilter, IssueStatus,
    UpdateIssueInput,
};
use crate::store::SnapshotStore;

/// Draws attempted before giving up on finding an unused id.
pub const MAX_ID_ATTEMPTS: usize = 64;

/// Tracker over a [`SnapshotStore`]. Every mutation is one
/// [`SnapshotStore::mutate`] call.
#[derive(Debug)]
pub struct LocalTracker<S> {
    store: S,
}

impl<S: SnapshotStore> LocalTracker<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Replace the whole snapshot, e.g. when seeding sample data.
    pub fn import(&self, issues: &[Issue]) -> Result<(), TrackerError> {
        self.store.write(issues)
    }
}

/// An id not already used in `issues`.
///
/// Redraws on collision up to [`MAX_ID_ATTEMPTS`] times.
pub(crate) fn allocate_id<R: Rng + ?Sized>(
    issues: &[Issue],
    rng: &mut R,
) -> Result<String, TrackerError> {
    for attempt in 0..MAX_ID_ATTEMPTS {
        let candidate = generate_issue_id_with(rng);
        if issues.iter().all(|issue| issue.id != candidate) {
            return Ok(candidate);
        }
        debug!(id = %candidate, attempt, "generated id already in use; redrawing");
    }
    Err(TrackerError::IdSpaceExhausted {
        attempts: MAX_ID_ATTEMPTS,
    })
}

fn require_title(title: &str) -> Result<String, TrackerError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::InvalidInput("title must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

/// `None` for blank strings so clearing a field round-trips as absent.
fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn position(issues: &[Issue], id: &str) -> Result<usize, TrackerError> {
    issues
        .iter()
        .position(|issue| issue.id == id)
        .ok_or_else(|| TrackerError::IssueNotFound(id.to_string()))
}

impl<S: SnapshotStore> IssueTracker for LocalTracker<S> {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, TrackerError> {
        let all = self.store.read()?;
        if filter.is_empty() {
            return Ok(all);
        }
        Ok(apply_filter(filter, &all).into_iter().cloned().collect())
    }

    fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        self.store
            .read()?
            .into_iter()
            .find(|issue| issue.id == id)
            .ok_or_else(|| TrackerError::IssueNotFound(id.to_string()))
    }

    fn create_issue(&self, input: &CreateIssueInput) -> Result<Issue, TrackerError> {
        let title = require_title(&input.title)?;

        let issue = self.store.mutate(|issues| {
            let id = allocate_id(issues, &mut rand::thread_rng())?;
            let mut issue = Issue::new(id, title, Utc::now());
            issue.description = input.description.as_deref().and_then(non_blank);
            issue.issue_type = input.issue_type.unwrap_or_default();
            issue.priority = input.priority.unwrap_or_default();
            issue.assignee = input.assignee.as_deref().and_then(non_blank);
            issue.labels.clone_from(&input.labels);
            issues.push(issue.clone());
            Ok(issue)
        })?;

        debug!(id = %issue.id, "issue created");
        Ok(issue)
    }

    fn update_issue(&self, id: &str, update: &UpdateIssueInput) -> Result<Issue, TrackerError> {
        let title = update.title.as_deref().map(require_title).transpose()?;

        let issue = self.store.mutate(|issues| {
            let idx = position(issues, id)?;
            let issue = &mut issues[idx];
            let now = Utc::now();

            if let Some(title) = title {
                issue.title = title;
            }
            if let Some(description) = &update.description {
                issue.description = non_blank(description);
            }
            if let Some(status) = update.status {
                if status == IssueStatus::Closed {
                    if issue.status != IssueStatus::Closed {
                        issue.closed_at = Some(now);
                    }
                } else {
                    issue.closed_at = None;
                }
                issue.status = status;
            }
            if let Some(issue_type) = update.issue_type {
                issue.issue_type = issue_type;
            }
            if let Some(priority) = update.priority {
                issue.priority = priority;
            }
            if let Some(assignee) = &update.assignee {
                issue.assignee = non_blank(assignee);
            }
            if let Some(labels) = &update.labels {
                issue.labels.clone_from(labels);
            }

            issue.touch(now);
            Ok(issue.clone())
        })?;

        debug!(id = %issue.id, status = %issue.status, "issue updated");
        Ok(issue)
    }

    fn delete_issue(&self, id: &str) -> Result<(), TrackerError> {
        self.store.mutate(|issues| {
            let idx = position(issues, id)?;
            issues.remove(idx);
            Ok(())
        })?;
        debug!(id, "issue deleted");
        Ok(())
    }

    fn add_dependency(&self, id: &str, dependency: &Dependency) -> Result<(), TrackerError> {
        self.store.mutate(|issues| {
            let idx = position(issues, id)?;
            if issues[idx].has_edge(dependency.dep_type, &dependency.target_id) {
                debug!(id, target_id = %dependency.target_id, "dependency already present");
                return Ok(());
            }

            if dependency.dep_type == DependencyType::Blocks {
                if let Some(cycle) = detect_cycle_on_add(issues, id, &dependency.target_id) {
                    warn!(id, target_id = %dependency.target_id, "{cycle}");
                }
            }

            let issue = &mut issues[idx];
            issue.dependencies.push(dependency.clone());
            issue.touch(Utc::now());
            debug!(
                id,
                dep_type = %dependency.dep_type,
                target_id = %dependency.target_id,
                "dependency added"
            );
            Ok(())
        })
    }

    fn remove_dependency(&self, id: &str, target_id: &str) -> Result<(), TrackerError> {
        self.store.mutate(|issues| {
            let idx = position(issues, id)?;
            let issue = &mut issues[idx];
            let before = issue.dependencies.len();
            issue.dependencies.retain(|dep| dep.target_id != target_id);
            let removed = before - issue.dependencies.len();
            if removed > 0 {
                issue.touch(Utc::now());
            }
            debug!(id, target_id, removed, "dependencies removed");
            Ok(())
        })
    }

    fn ready_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        let all = self.store.read()?;
        Ok(sort_issues(get_ready_issues_local(&all))
            .into_iter()
            .cloned()
            .collect())
    }
}
