//! `bb dep`: manage typed edges between issues.
//!
//! Edges are owned by the issue that declares them:
//! - `bb dep add <id> --blocks <target>`: `<id>` waits on `<target>`
//! - `bb dep add <id> --parent <target>`: `<id>` is a child of `<target>`
//! - `bb dep add <id> --related <target>`: informational link
//! - `bb dep rm <id> <target>`: drop every edge from `<id>` to `<target>`

use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use tracing::warn;

use beadboard_core::graph::{CycleWarning, detect_cycle_on_add};
use beadboard_core::{Dependency, DependencyType, IssueTracker};

use crate::cmd::snapshot;
use crate::output::{OutputMode, fail, render_mode};

#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommand,
}

#[derive(Subcommand, Debug)]
pub enum DepCommand {
    #[command(
        about = "Add an edge from one issue to another",
        after_help = "EXAMPLES:\n    # bd-c3d4 waits on bd-a1b2\n    bb dep add bd-c3d4 --blocks bd-a1b2\n\n    # Put bd-e5f6 under the epic bd-k1l2\n    bb dep add bd-e5f6 --parent bd-k1l2"
    )]
    Add(DepAddArgs),

    #[command(
        about = "Remove the edges from one issue to another",
        after_help = "EXAMPLES:\n    # bd-c3d4 no longer waits on bd-a1b2\n    bb dep rm bd-c3d4 bd-a1b2"
    )]
    Rm(DepRmArgs),
}

/// Exactly one edge kind per `dep add`.
#[derive(Args, Debug, Default)]
#[group(required = true, multiple = false)]
pub struct EdgeTarget {
    /// <ID> waits on TARGET until TARGET is closed.
    #[arg(long, value_name = "TARGET")]
    pub blocks: Option<String>,

    /// <ID> is a child of TARGET.
    #[arg(long, value_name = "TARGET")]
    pub parent: Option<String>,

    /// <ID> relates to TARGET (no effect on readiness).
    #[arg(long, value_name = "TARGET")]
    pub related: Option<String>,
}

impl EdgeTarget {
    pub fn dependency(&self) -> Option<Dependency> {
        if let Some(target) = &self.blocks {
            return Some(Dependency::blocks(target.as_str()));
        }
        if let Some(target) = &self.parent {
            return Some(Dependency::parent(target.as_str()));
        }
        self.related
            .as_deref()
            .map(Dependency::related)
    }
}

#[derive(Args, Debug)]
pub struct DepAddArgs {
    /// Issue that owns the new edge.
    pub id: String,

    #[command(flatten)]
    pub target: EdgeTarget,
}

#[derive(Args, Debug)]
pub struct DepRmArgs {
    /// Issue that owns the edge.
    pub id: String,

    /// Edge target to drop.
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct DepOutput {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dep_type: Option<DependencyType>,
    pub target: String,
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleWarning>,
}

fn write_text(out: &DepOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let kind = out.dep_type.map_or("-", DependencyType::as_str);
    let action = if out.removed { "removed" } else { "added" };
    writeln!(w, "{action}  {}  {kind}  {}", out.id, out.target)?;
    if let Some(cycle) = &out.cycle {
        writeln!(w, "warning  {cycle}")?;
    }
    Ok(())
}

fn write_pretty(out: &DepOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.removed {
        writeln!(w, "✓ Removed edges {} → {}", out.id, out.target)?;
    } else {
        let relation = match out.dep_type {
            Some(DependencyType::Blocks) => "now waits on",
            Some(DependencyType::Parent) => "is now a child of",
            _ => "now relates to",
        };
        writeln!(w, "✓ {} {relation} {}", out.id, out.target)?;
    }
    if let Some(cycle) = &out.cycle {
        writeln!(w, "  warning: {cycle}")?;
    }
    Ok(())
}

pub fn run_dep_add(
    args: &DepAddArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    let Some(dependency) = args.target.dependency() else {
        anyhow::bail!("one of --blocks, --parent or --related is required");
    };

    let cycle = if dependency.dep_type == DependencyType::Blocks {
        let all = snapshot(tracker, output)?;
        detect_cycle_on_add(&all, &args.id, &dependency.target_id)
    } else {
        None
    };
    if let Some(cycle) = &cycle {
        warn!(path = ?cycle.cycle_path, "new edge closes a blocks cycle");
    }

    tracker
        .add_dependency(&args.id, &dependency)
        .map_err(|err| fail(output, err))?;

    let out = DepOutput {
        id: args.id.clone(),
        dep_type: Some(dependency.dep_type),
        target: dependency.target_id,
        removed: false,
        cycle,
    };
    render_mode(output, &out, write_text, write_pretty)
}

pub fn run_dep_rm(
    args: &DepRmArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    tracker
        .remove_dependency(&args.id, &args.target)
        .map_err(|err| fail(output, err))?;

    let out = DepOutput {
        id: args.id.clone(),
        dep_type: None,
        target: args.target.clone(),
        removed: true,
        cycle: None,
    };
    render_mode(output, &out, write_text, write_pretty)
}

pub fn run_dep(args: &DepArgs, tracker: &dyn IssueTracker, output: OutputMode) -> anyhow::Result<()> {
    match &args.command {
        DepCommand::Add(add) => run_dep_add(add, tracker, output),
        DepCommand::Rm(rm) => run_dep_rm(rm, tracker, output),
    }
}
