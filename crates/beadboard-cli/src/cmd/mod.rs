pub mod board;
pub mod create;
pub mod delete;
pub mod dep;
pub mod init;
pub mod list;
pub mod show;
pub mod update;

use crate::output::{OutputMode, fail};
use beadboard_core::{Issue, IssueFilter, IssueTracker};
use serde::Serialize;

/// The tracker's full, unfiltered snapshot.
pub fn snapshot(tracker: &dyn IssueTracker, output: OutputMode) -> anyhow::Result<Vec<Issue>> {
    tracker
        .list_issues(&IssueFilter::default())
        .map_err(|err| fail(output, err))
}

/// Compact reference to a related issue in detail views.
#[derive(Debug, Clone, Serialize)]
pub struct IssueRef {
    pub id: String,
    pub title: String,
    pub status: String,
}

impl IssueRef {
    pub fn of(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            title: issue.title.clone(),
            status: issue.status.to_string(),
        }
    }

    pub fn all(issues: &[&Issue]) -> Vec<Self> {
        issues.iter().map(|issue| Self::of(issue)).collect()
    }
}
