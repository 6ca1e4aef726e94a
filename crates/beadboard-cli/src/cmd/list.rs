//! `bb list`, `bb ready` and `bb blocked`.

use crate::cmd::{IssueRef, snapshot};
use crate::output::{IssueRow, OutputMode, fail, render_list, render_mode};
use beadboard_core::graph::{get_blocked_issues, get_blockers, sort_issues};
use beadboard_core::{
    Issue, IssueFilter, IssueStatus, IssueTracker, IssueType, Priority, ready_issues_or_local,
};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Filter by status: open, in_progress, blocked, closed. Comma-separated or repeated.
    #[arg(short, long, value_delimiter = ',')]
    pub status: Vec<IssueStatus>,

    /// Filter by type: bug, feature, task, epic.
    #[arg(short = 't', long = "type", value_delimiter = ',')]
    pub issue_type: Vec<IssueType>,

    /// Filter by priority: 0-4 or P0-P4.
    #[arg(short, long, value_delimiter = ',')]
    pub priority: Vec<Priority>,

    /// Only issues assigned to this person.
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Case-insensitive match on id, title and description.
    #[arg(long)]
    pub search: Option<String>,

    /// Maximum issues to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl ListArgs {
    pub fn filter(&self) -> IssueFilter {
        IssueFilter {
            statuses: self.status.clone(),
            types: self.issue_type.clone(),
            priorities: self.priority.clone(),
            assignee: self.assignee.clone(),
            search: self.search.clone(),
        }
    }
}

pub fn run_list(
    args: &ListArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    let issues = tracker
        .list_issues(&args.filter())
        .map_err(|err| fail(output, err))?;
    let mut sorted = sort_issues(&issues);
    if let Some(limit) = args.limit {
        sorted.truncate(limit);
    }
    let rows: Vec<_> = sorted.into_iter().map(IssueRow).collect();
    render_list(&rows, output)?;
    Ok(())
}

/// Open issues with nothing outstanding blocking them.
pub fn run_ready(tracker: &dyn IssueTracker, output: OutputMode) -> anyhow::Result<()> {
    let ready = ready_issues_or_local(tracker).map_err(|err| fail(output, err))?;
    let rows: Vec<_> = sort_issues(&ready).into_iter().map(IssueRow).collect();
    render_list(&rows, output)?;
    Ok(())
}

/// A blocked issue and the unfinished issues it waits on.
#[derive(Debug, Serialize)]
pub struct BlockedEntry<'a> {
    #[serde(flatten)]
    pub issue: &'a Issue,
    pub waiting_on: Vec<IssueRef>,
}

pub fn blocked_entries(all: &[Issue]) -> Vec<BlockedEntry<'_>> {
    sort_issues(get_blocked_issues(all))
        .into_iter()
        .map(|issue| {
            let waiting: Vec<&Issue> = get_blockers(issue, all)
                .into_iter()
                .filter(|blocker| !blocker.is_closed())
                .collect();
            BlockedEntry {
                issue,
                waiting_on: IssueRef::all(&waiting),
            }
        })
        .collect()
}

pub fn run_blocked(tracker: &dyn IssueTracker, output: OutputMode) -> anyhow::Result<()> {
    let all = snapshot(tracker, output)?;
    let entries = blocked_entries(&all);
    render_mode(
        output,
        &entries,
        |entries, w| {
            if !entries.is_empty() {
                writeln!(w, "ID  PRI  TYPE  TITLE  WAITING_ON")?;
            }
            for entry in entries {
                let waiting: Vec<&str> = entry.waiting_on.iter().map(|r| r.id.as_str()).collect();
                writeln!(
                    w,
                    "{}  {}  {}  {}  {}",
                    entry.issue.id,
                    entry.issue.priority.get(),
                    entry.issue.issue_type,
                    entry.issue.title,
                    waiting.join(",")
                )?;
            }
            Ok(())
        },
        |entries, w| {
            if entries.is_empty() {
                return writeln!(w, "Nothing is blocked.");
            }
            for entry in entries {
                writeln!(
                    w,
                    "{:<10} {} {:<7} {}",
                    entry.issue.id, entry.issue.priority, entry.issue.issue_type, entry.issue.title
                )?;
                for blocker in &entry.waiting_on {
                    writeln!(
                        w,
                        "    waiting on {} ({}) {}",
                        blocker.id, blocker.status, blocker.title
                    )?;
                }
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use beadboard_core::LocalTracker;
    use beadboard_core::sample::sample_issues;
    use beadboard_core::store::MemoryStore;
    use chrono::Utc;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ListArgs,
    }

    #[test]
    fn list_args_defaults() {
        let w = Wrapper::parse_from(["test"]);
        assert!(w.args.status.is_empty());
        assert!(w.args.issue_type.is_empty());
        assert!(w.args.limit.is_none());
        assert!(w.args.filter().is_empty());
    }

    #[test]
    fn list_args_parse_multi_valued_filters() {
        let w = Wrapper::parse_from([
            "test",
            "--status",
            "open,in_progress",
            "-t",
            "bug",
            "--type",
            "epic",
            "-p",
            "P0,1",
            "--assignee",
            "agent",
        ]);
        let filter = w.args.filter();
        assert_eq!(
            filter.statuses,
            vec![IssueStatus::Open, IssueStatus::InProgress]
        );
        assert_eq!(filter.types, vec![IssueType::Bug, IssueType::Epic]);
        assert_eq!(
            filter.priorities,
            vec![Priority::HIGHEST, Priority::new(1).unwrap()]
        );
        assert_eq!(filter.assignee.as_deref(), Some("agent"));
    }

    #[test]
    fn list_args_reject_unknown_status() {
        assert!(Wrapper::try_parse_from(["test", "--status", "doing"]).is_err());
    }

    #[test]
    fn blocked_entries_list_outstanding_blockers() {
        let all = sample_issues(Utc::now());
        let entries = blocked_entries(&all);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].issue.id, "bd-k1l2");
        assert_eq!(entries[0].waiting_on.len(), 1);
        assert_eq!(entries[0].waiting_on[0].id, "bd-a1b2");
        assert_eq!(entries[0].waiting_on[0].status, "in_progress");

        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["id"], "bd-k1l2");
        assert_eq!(json[0]["waiting_on"][0]["id"], "bd-a1b2");
    }

    #[test]
    fn commands_run_against_local_tracker() {
        let tracker = LocalTracker::new(MemoryStore::new());
        tracker.import(&sample_issues(Utc::now())).unwrap();
        run_list(&ListArgs::default(), &tracker, OutputMode::Json).unwrap();
        run_ready(&tracker, OutputMode::Text).unwrap();
        run_blocked(&tracker, OutputMode::Pretty).unwrap();
    }
}
