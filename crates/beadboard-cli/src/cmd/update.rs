//! `bb update` and `bb close`.

use crate::output::{CliError, OutputMode, fail, render_error, render_mode};
use beadboard_core::{
    Issue, IssueStatus, IssueTracker, IssueType, Priority, UpdateIssueInput,
};
use clap::Args;
use std::io::Write;

/// Arguments for `bb update`.
#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Issue id to update.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// New status: open, in_progress, blocked, closed.
    #[arg(short, long)]
    pub status: Option<IssueStatus>,

    /// New type: bug, feature, task, epic.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<IssueType>,

    /// New priority 0-4.
    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// New assignee (pass an empty string to unassign).
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Replace all labels. Comma-separated; pass an empty string to clear.
    #[arg(short, long = "labels", value_delimiter = ',')]
    pub labels: Option<Vec<String>>,
}

impl UpdateArgs {
    pub fn input(&self) -> UpdateIssueInput {
        UpdateIssueInput {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            issue_type: self.issue_type,
            priority: self.priority,
            assignee: self.assignee.clone(),
            labels: self.labels.as_ref().map(|labels| {
                labels
                    .iter()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect()
            }),
        }
    }
}

/// Arguments for `bb close`.
#[derive(Args, Debug, Default)]
pub struct CloseArgs {
    /// Issue ids to close.
    #[arg(required = true, value_name = "ID")]
    pub ids: Vec<String>,
}

fn write_issue_text(issue: &Issue, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "{}  {}", issue.id, issue.status)
}

pub fn run_update(
    args: &UpdateArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    let input = args.input();
    if input.is_empty() {
        render_error(
            output,
            &CliError::new("nothing to update")
                .with_suggestion("Pass at least one of --title, --status, --priority, ..."),
        )?;
        anyhow::bail!("nothing to update");
    }

    let issue = tracker
        .update_issue(&args.id, &input)
        .map_err(|err| fail(output, err))?;
    render_mode(output, &issue, write_issue_text, |issue, w| {
        writeln!(w, "✓ Updated {}: {}", issue.id, issue.title)?;
        writeln!(
            w,
            "  {} {} {}",
            issue.priority, issue.issue_type, issue.status
        )
    })
}

pub fn run_close(
    args: &CloseArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    let mut closed = Vec::with_capacity(args.ids.len());
    for id in &args.ids {
        closed.push(tracker.close_issue(id).map_err(|err| fail(output, err))?);
    }
    render_mode(
        output,
        &closed,
        |closed, w| {
            for issue in closed {
                write_issue_text(issue, w)?;
            }
            Ok(())
        },
        |closed, w| {
            for issue in closed {
                writeln!(w, "✓ Closed {}: {}", issue.id, issue.title)?;
            }
            Ok(())
        },
    )
}
