//! `bb create`: open a new issue, optionally wired into the graph.

use crate::output::{CliError, OutputMode, fail, render_error, render_mode};
use beadboard_core::graph::find_issue;
use beadboard_core::{
    CreateIssueInput, Dependency, IssueFilter, IssueTracker, IssueType, Priority, TrackerError,
};
use clap::Args;
use tracing::warn;

#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Issue title.
    pub title: String,

    /// Longer description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Issue type: bug, feature, task, epic. Defaults to task.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<IssueType>,

    /// Priority 0-4 (or P0-P4). Defaults to 2.
    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// Assignee.
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Labels. Comma-separated or repeated.
    #[arg(short, long = "label", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Parent epic id.
    #[arg(long)]
    pub parent: Option<String>,

    /// Issue ids the new issue waits on. Comma-separated or repeated.
    #[arg(long, value_delimiter = ',')]
    pub blocked_by: Vec<String>,
}

impl CreateArgs {
    pub fn input(&self) -> CreateIssueInput {
        CreateIssueInput {
            title: self.title.clone(),
            description: self.description.clone(),
            issue_type: self.issue_type,
            priority: self.priority,
            assignee: self.assignee.clone(),
            labels: self.labels.clone(),
        }
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.parent
            .iter()
            .map(Dependency::parent)
            .chain(self.blocked_by.iter().map(Dependency::blocks))
            .collect()
    }
}

/// Wire `deps` onto the freshly created `id`, collecting failures instead of
/// stopping: the issue already exists, so later edges are still worth adding.
fn add_dependencies<'a>(
    tracker: &dyn IssueTracker,
    id: &str,
    deps: &'a [Dependency],
) -> Vec<(&'a Dependency, TrackerError)> {
    let mut failed = Vec::new();
    for dep in deps {
        if let Err(err) = tracker.add_dependency(id, dep) {
            warn!(id, target_id = %dep.target_id, error = %err, "dependency not added");
            failed.push((dep, err));
        }
    }
    failed
}

pub fn run_create(
    args: &CreateArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    let created = tracker
        .create_issue(&args.input())
        .map_err(|err| fail(output, err))?;

    let deps = args.dependencies();
    let failed = add_dependencies(tracker, &created.id, &deps);
    let issue = if deps.is_empty() {
        created
    } else {
        match tracker.list_issues(&IssueFilter::default()) {
            Ok(all) => {
                if let Some(target) = deps
                    .iter()
                    .map(|dep| dep.target_id.as_str())
                    .find(|target| find_issue(target, &all).is_none())
                {
                    warn!(id = %created.id, missing = target, "dependency target does not exist yet");
                }
                find_issue(&created.id, &all).cloned().unwrap_or(created)
            }
            Err(err) => {
                warn!(id = %created.id, error = %err, "could not re-read the created issue");
                created
            }
        }
    };

    render_mode(
        output,
        &issue,
        |issue, w| writeln!(w, "{}", issue.id),
        |issue, w| {
            writeln!(w, "✓ Created {}: {}", issue.id, issue.title)?;
            writeln!(
                w,
                "  {} {} {}",
                issue.priority, issue.issue_type, issue.status
            )
        },
    )?;

    if failed.is_empty() {
        return Ok(());
    }
    for (dep, err) in &failed {
        let mut error = CliError::from(err);
        error.message = format!(
            "{} was created, but its {} edge to {} was not added: {err}",
            issue.id, dep.dep_type, dep.target_id
        );
        render_error(output, &error)?;
    }
    anyhow::bail!(
        "{} was created with {} of {} dependencies missing",
        issue.id,
        failed.len(),
        deps.len()
    )
}
