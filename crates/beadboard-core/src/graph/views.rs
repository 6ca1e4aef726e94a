//! Derived views: the kanban board and filtered lists.

#![allow(clippy::must_use_candidate)]

use serde::Serialize;

use super::blocking::{get_blocked_issues, get_ready_issues_local};
use super::order::{issues_by_status, sort_issues};
use crate::model::{Issue, IssueFilter, IssueStatus};

/// Kanban columns. Each column is in display order.
///
/// `blocked` and `ready` partition the open issues; issues whose status is
/// `blocked` appear in none of the columns, the same as in the web board.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Board<'a> {
    pub blocked: Vec<&'a Issue>,
    pub ready: Vec<&'a Issue>,
    pub in_progress: Vec<&'a Issue>,
    pub closed: Vec<&'a Issue>,
}

impl<'a> Board<'a> {
    /// Column names and contents, left to right.
    pub fn columns(&self) -> [(&'static str, &[&'a Issue]); 4] {
        [
            ("blocked", self.blocked.as_slice()),
            ("ready", self.ready.as_slice()),
            ("in_progress", self.in_progress.as_slice()),
            ("closed", self.closed.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.blocked.len() + self.ready.len() + self.in_progress.len() + self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the board for a snapshot.
pub fn board(all: &[Issue]) -> Board<'_> {
    Board {
        blocked: sort_issues(get_blocked_issues(all)),
        ready: sort_issues(get_ready_issues_local(all)),
        in_progress: issues_by_status(IssueStatus::InProgress, all),
        closed: issues_by_status(IssueStatus::Closed, all),
    }
}

/// Issues matching `filter`, in snapshot order.
pub fn apply_filter<'a>(filter: &IssueFilter, all: &'a [Issue]) -> Vec<&'a Issue> {
    if filter.is_empty() {
        return all.iter().collect();
    }
    all.iter().filter(|issue| filter.matches(issue)).collect()
}
