//! Request shapes handed to an [`IssueTracker`](crate::tracker::IssueTracker).

use serde::{Deserialize, Serialize};

use super::issue::{Issue, IssueStatus, IssueType, Priority};

/// Fields accepted when creating an issue. Unset fields take the
/// tracker's defaults (`task`, P2, no assignee).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueInput {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, alias = "tags", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl CreateIssueInput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update: only `Some` fields are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl UpdateIssueInput {
    pub fn status(status: IssueStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Returns `true` when no field would change.
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.issue_type.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.labels.is_none()
    }
}

/// Snapshot filter. Empty collections and `None` mean "don't filter".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<IssueStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<IssueType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priorities: Vec<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl IssueFilter {
    pub const fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.types.is_empty()
            && self.priorities.is_empty()
            && self.assignee.is_none()
            && self.search.is_none()
    }

    /// Test one issue against every populated criterion.
    ///
    /// `search` is a case-insensitive substring match over id, title and
    /// description.
    pub fn matches(&self, issue: &Issue) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&issue.status) {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&issue.issue_type) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&issue.priority) {
            return false;
        }
        if let Some(assignee) = &self.assignee {
            if issue.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if needle.is_empty() {
                return true;
            }
            let hit = issue.id.to_lowercase().contains(&needle)
                || issue.title.to_lowercase().contains(&needle)
                || issue
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}
