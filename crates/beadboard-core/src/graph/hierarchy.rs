//! Parent/child containment and the epic-grouped view.
//!
//! # Terminology
//!
//! - **Parent**: the target of an issue's first declared `parent` edge.
//! - **Epic**: an issue of type `epic`. Epics head groups in the grouped
//!   view and are never bucketed under another epic, even if they declare a
//!   `parent` edge themselves.
//! - **Progress**: closed children over all children of an epic.
//!
//! # Dangling parents
//!
//! [`get_parent`] resolves the edge and reports nothing when the target is
//! gone. [`get_issues_without_parent`] only checks that a `parent` edge is
//! *present*, so an issue whose epic was deleted is neither grouped under an
//! epic nor listed as unassigned. Detail views list such an issue with no
//! parent; the grouped view leaves it out entirely.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
)]

use std::fmt;

use serde::Serialize;

use super::resolve_edges;
use crate::model::{DependencyType, Issue};

/// Issues declaring a `parent` edge to `issue_id`, in snapshot order.
pub fn get_children<'a>(issue_id: &str, all: &'a [Issue]) -> Vec<&'a Issue> {
    all.iter()
        .filter(|candidate| candidate.has_edge(DependencyType::Parent, issue_id))
        .collect()
}

/// The issue targeted by `issue`'s first `parent` edge.
///
/// Returns `None` if there is no `parent` edge or if the first one dangles.
/// Later `parent` edges are not consulted.
pub fn get_parent<'a>(issue: &Issue, all: &'a [Issue]) -> Option<&'a Issue> {
    let target = issue.parent_id()?;
    super::find_issue(target, all)
}

/// Every epic, in snapshot order.
pub fn get_epics(all: &[Issue]) -> Vec<&Issue> {
    all.iter().filter(|issue| issue.is_epic()).collect()
}

/// Non-epic issues that declare no `parent` edge at all.
pub fn get_issues_without_parent(all: &[Issue]) -> Vec<&Issue> {
    all.iter()
        .filter(|issue| !issue.is_epic() && issue.parent_id().is_none())
        .collect()
}

/// Completion of an epic's direct children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EpicProgress {
    /// Children in the closed state.
    pub done: usize,
    /// All children.
    pub total: usize,
}

impl EpicProgress {
    /// Progress over an already resolved set of children.
    pub fn of(children: &[&Issue]) -> Self {
        Self {
            done: children.iter().filter(|child| child.is_closed()).count(),
            total: children.len(),
        }
    }

    /// Percentage in `0.0..=100.0`; `0.0` for an epic with no children.
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }

    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }

    pub const fn remaining(&self) -> usize {
        self.total.saturating_sub(self.done)
    }
}

impl fmt::Display for EpicProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.0}%)", self.done, self.total, self.percentage())
    }
}

/// Progress over the direct children of `epic_id`.
pub fn epic_progress(epic_id: &str, all: &[Issue]) -> EpicProgress {
    EpicProgress::of(&get_children(epic_id, all))
}

/// One epic and its direct children.
#[derive(Debug, Clone, Serialize)]
pub struct EpicGroup<'a> {
    pub epic: &'a Issue,
    pub children: Vec<&'a Issue>,
    pub progress: EpicProgress,
}

/// The grouped view: every epic with its children, plus unassigned issues.
#[derive(Debug, Clone, Serialize)]
pub struct EpicGrouping<'a> {
    pub groups: Vec<EpicGroup<'a>>,
    pub unassigned: Vec<&'a Issue>,
}

impl EpicGrouping<'_> {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.unassigned.is_empty()
    }
}

/// Build the grouped view. Groups follow snapshot order of the epics.
pub fn group_by_epic(all: &[Issue]) -> EpicGrouping<'_> {
    let groups = get_epics(all)
        .into_iter()
        .map(|epic| {
            let children = get_children(&epic.id, all);
            let progress = EpicProgress::of(&children);
            EpicGroup {
                epic,
                children,
                progress,
            }
        })
        .collect();

    EpicGrouping {
        groups,
        unassigned: get_issues_without_parent(all),
    }
}

/// Every `parent` edge target of `issue` that resolves, in declaration order.
///
/// Used by detail views to surface ambiguous multi-parent issues.
pub fn resolved_parents<'a>(issue: &Issue, all: &'a [Issue]) -> Vec<&'a Issue> {
    resolve_edges(issue, DependencyType::Parent, all)
}
