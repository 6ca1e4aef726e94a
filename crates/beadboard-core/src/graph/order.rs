//! Display ordering.
//!
//! Every list view shares one ordering: priority ascending (P0 first), then
//! most recently updated first. The sort is stable, so issues that tie on
//! both keys keep their snapshot order.

#![allow(clippy::must_use_candidate)]

use std::cmp::Ordering;

use crate::model::{Issue, IssueStatus};

/// Comparator behind [`sort_issues`].
pub fn display_order(a: &Issue, b: &Issue) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
}

/// A freshly ordered sequence; the input is left untouched.
pub fn sort_issues<'a, I>(issues: I) -> Vec<&'a Issue>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut sorted: Vec<&'a Issue> = issues.into_iter().collect();
    sorted.sort_by(|a, b| display_order(a, b));
    sorted
}

/// Issues in `status`, in display order.
pub fn issues_by_status(status: IssueStatus, all: &[Issue]) -> Vec<&Issue> {
    sort_issues(all.iter().filter(|issue| issue.status == status))
}
