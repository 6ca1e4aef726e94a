//! `bb show`: one issue with its neighbourhood in the dependency graph.

use crate::cmd::{IssueRef, snapshot};
use crate::output::{OutputMode, fail, pretty_kv, pretty_rule, pretty_section, render_mode};
use beadboard_core::graph::{
    blocking_chain, epic_progress, find_issue, get_blocked, get_blockers, get_children,
    get_related, is_issue_ready, resolved_parents, sort_issues,
};
use beadboard_core::{Issue, IssueTracker};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue id, e.g. bd-a1b2.
    pub id: String,
}

/// Issue detail as returned in JSON output.
#[derive(Debug, Serialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: Issue,
    pub ready: bool,
    /// Issues this one waits on.
    pub blockers: Vec<IssueRef>,
    /// Issues waiting on this one.
    pub blocks: Vec<IssueRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<IssueRef>,
    pub children: Vec<IssueRef>,
    pub related: Vec<IssueRef>,
    /// Every issue transitively upstream of this one, nearest first.
    pub blocking_chain: Vec<IssueRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
}

/// Build the detail view of `issue` against the snapshot `all`.
pub fn issue_detail(issue: Issue, all: &[Issue]) -> IssueDetail {
    let children = sort_issues(get_children(&issue.id, all));
    let progress = issue
        .is_epic()
        .then(|| epic_progress(&issue.id, all).to_string());
    IssueDetail {
        ready: is_issue_ready(&issue, all),
        blockers: IssueRef::all(&get_blockers(&issue, all)),
        blocks: IssueRef::all(&sort_issues(get_blocked(&issue.id, all))),
        parents: IssueRef::all(&resolved_parents(&issue, all)),
        children: IssueRef::all(&children),
        related: IssueRef::all(&get_related(&issue, all)),
        blocking_chain: IssueRef::all(&blocking_chain(&issue, all)),
        progress,
        issue,
    }
}

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn refs_line(refs: &[IssueRef]) -> String {
    if refs.is_empty() {
        return "-".to_string();
    }
    refs.iter()
        .map(|r| format!("{} ({})", r.id, r.status))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ids(refs: &[IssueRef]) -> String {
    refs.iter().map(|r| r.id.as_str()).collect::<Vec<_>>().join(",")
}

fn write_text(detail: &IssueDetail, w: &mut dyn Write) -> io::Result<()> {
    let issue = &detail.issue;
    writeln!(w, "id\t{}", issue.id)?;
    writeln!(w, "title\t{}", issue.title)?;
    writeln!(w, "status\t{}", issue.status)?;
    writeln!(w, "type\t{}", issue.issue_type)?;
    writeln!(w, "priority\t{}", issue.priority.get())?;
    writeln!(w, "assignee\t{}", issue.assignee.as_deref().unwrap_or("-"))?;
    writeln!(w, "labels\t{}", issue.labels.join(","))?;
    writeln!(w, "ready\t{}", detail.ready)?;
    writeln!(w, "blockers\t{}", ids(&detail.blockers))?;
    writeln!(w, "blocks\t{}", ids(&detail.blocks))?;
    writeln!(w, "parents\t{}", ids(&detail.parents))?;
    writeln!(w, "children\t{}", ids(&detail.children))?;
    writeln!(w, "related\t{}", ids(&detail.related))?;
    writeln!(w, "chain\t{}", ids(&detail.blocking_chain))
}

fn write_pretty(detail: &IssueDetail, w: &mut dyn Write) -> io::Result<()> {
    let issue = &detail.issue;
    pretty_section(w, &format!("{} {}", issue.id, issue.title))?;
    pretty_kv(w, "Status", issue.status.as_str())?;
    pretty_kv(w, "Type", issue.issue_type.as_str())?;
    pretty_kv(w, "Priority", issue.priority.to_string())?;
    pretty_kv(w, "Assignee", issue.assignee.as_deref().unwrap_or("-"))?;
    if !issue.labels.is_empty() {
        pretty_kv(w, "Labels", issue.labels.join(", "))?;
    }
    pretty_kv(w, "Created", local_time(issue.created_at))?;
    pretty_kv(w, "Updated", local_time(issue.updated_at))?;
    if let Some(closed) = issue.closed_at {
        pretty_kv(w, "Closed", local_time(closed))?;
    }
    if let Some(progress) = &detail.progress {
        pretty_kv(w, "Progress", progress)?;
    }
    if issue.is_open() {
        pretty_kv(w, "Ready", if detail.ready { "yes" } else { "no" })?;
    }

    if let Some(description) = issue.description.as_deref().filter(|d| !d.trim().is_empty()) {
        writeln!(w)?;
        writeln!(w, "{description}")?;
    }

    writeln!(w)?;
    pretty_rule(w)?;
    pretty_kv(w, "Blocked by", refs_line(&detail.blockers))?;
    pretty_kv(w, "Blocks", refs_line(&detail.blocks))?;
    if detail.parents.len() > 1 {
        // Only the first parent counts for hierarchy.
        pretty_kv(w, "Parents", refs_line(&detail.parents))?;
    } else {
        pretty_kv(w, "Parent", refs_line(&detail.parents))?;
    }
    pretty_kv(w, "Children", refs_line(&detail.children))?;
    pretty_kv(w, "Related", refs_line(&detail.related))?;
    if detail.blocking_chain.len() > detail.blockers.len() {
        pretty_kv(w, "Upstream", refs_line(&detail.blocking_chain))?;
    }
    Ok(())
}

pub fn run_show(
    args: &ShowArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    let all = snapshot(tracker, output)?;
    // Prefer the snapshot copy; the bridge may return fewer edges from `bd show`.
    let issue = match find_issue(&args.id, &all) {
        Some(issue) => issue.clone(),
        None => tracker.get_issue(&args.id).map_err(|err| fail(output, err))?,
    };
    let detail = issue_detail(issue, &all);
    render_mode(output, &detail, write_text, write_pretty)
}
