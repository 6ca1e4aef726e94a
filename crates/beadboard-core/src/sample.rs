//! Demo snapshot for onboarding and tests.
//!
//! Six issues: one in progress, three open, one closed, and an epic
//! (`bd-k1l2`) that is blocked by the in-progress authentication work.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::TrackerError;
use crate::model::{Dependency, Issue, IssueStatus, IssueType, Priority};
use crate::store::SnapshotStore;

struct Seed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    status: IssueStatus,
    issue_type: IssueType,
    priority: u8,
    assignee: Option<&'static str>,
    labels: &'static [&'static str],
    blocked_by: Option<&'static str>,
    created_ago: Duration,
    updated_ago: Duration,
}

fn seeds() -> [Seed; 6] {
    [
        Seed {
            id: "bd-a1b2",
            title: "Set up authentication system",
            description: "Implement user authentication with JWT tokens and secure password hashing.",
            status: IssueStatus::InProgress,
            issue_type: IssueType::Feature,
            priority: 0,
            assignee: Some("agent"),
            labels: &["backend", "security"],
            blocked_by: None,
            created_ago: Duration::days(3),
            updated_ago: Duration::hours(1),
        },
        Seed {
            id: "bd-c3d4",
            title: "Fix memory leak in data processing",
            description: "Users report slow performance after extended use. Memory grows steadily in the data processing module.",
            status: IssueStatus::Open,
            issue_type: IssueType::Bug,
            priority: 1,
            assignee: None,
            labels: &["performance", "critical"],
            blocked_by: None,
            created_ago: Duration::days(2),
            updated_ago: Duration::days(2),
        },
        Seed {
            id: "bd-e5f6",
            title: "Add dark mode support",
            description: "System-aware dark mode with a manual toggle.",
            status: IssueStatus::Open,
            issue_type: IssueType::Feature,
            priority: 2,
            assignee: None,
            labels: &["ui", "enhancement"],
            blocked_by: None,
            created_ago: Duration::days(1),
            updated_ago: Duration::days(1),
        },
        Seed {
            id: "bd-g7h8",
            title: "Update dependencies to latest versions",
            description: "Review and bump all dependencies to their latest stable versions. Check for breaking changes.",
            status: IssueStatus::Open,
            issue_type: IssueType::Task,
            priority: 3,
            assignee: None,
            labels: &["maintenance"],
            blocked_by: None,
            created_ago: Duration::hours(12),
            updated_ago: Duration::hours(12),
        },
        Seed {
            id: "bd-i9j0",
            title: "Design new landing page",
            description: "Mockups for the updated landing page with an improved conversion flow.",
            status: IssueStatus::Closed,
            issue_type: IssueType::Task,
            priority: 2,
            assignee: Some("designer"),
            labels: &["design", "marketing"],
            blocked_by: None,
            created_ago: Duration::days(7),
            updated_ago: Duration::days(5),
        },
        Seed {
            id: "bd-k1l2",
            title: "Implement real-time collaboration",
            description: "WebSocket support for real-time multi-user collaboration on documents.",
            status: IssueStatus::Open,
            issue_type: IssueType::Epic,
            priority: 1,
            assignee: None,
            labels: &["backend", "realtime"],
            blocked_by: Some("bd-a1b2"),
            created_ago: Duration::days(4),
            updated_ago: Duration::days(4),
        },
    ]
}

impl Seed {
    fn into_issue(self, now: DateTime<Utc>) -> Issue {
        let mut issue = Issue::new(self.id, self.title, now - self.created_ago)
            .with_status(self.status)
            .with_type(self.issue_type)
            .with_priority(Priority::new(self.priority).unwrap_or_default())
            .with_updated_at(now - self.updated_ago);
        issue.description = Some(self.description.to_string());
        issue.assignee = self.assignee.map(str::to_string);
        issue.labels = self.labels.iter().map(|l| (*l).to_string()).collect();
        if let Some(blocker) = self.blocked_by {
            issue.dependencies.push(Dependency::blocks(blocker));
        }
        if issue.is_closed() {
            issue.closed_at = Some(issue.updated_at);
        }
        issue
    }
}

/// The demo snapshot with timestamps relative to `now`.
pub fn sample_issues(now: DateTime<Utc>) -> Vec<Issue> {
    seeds()
        .into_iter()
        .map(|seed| seed.into_issue(now))
        .collect()
}

/// Write the demo snapshot into `store` if it holds no issues.
///
/// Returns `true` when the sample was written.
pub fn seed_if_empty<S: SnapshotStore + ?Sized>(store: &S) -> Result<bool, TrackerError> {
    if !store.read()?.is_empty() {
        debug!("store already has issues; skipping sample data");
        return Ok(false);
    }
    store.write(&sample_issues(Utc::now()))?;
    Ok(true)
}
