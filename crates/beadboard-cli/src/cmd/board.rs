//! `bb board` and `bb epics`: the grouped views.

use crate::cmd::snapshot;
use crate::output::{IssueRow, OutputMode, Renderable, pretty_section, render_mode};
use beadboard_core::IssueTracker;
use beadboard_core::graph::{Board, CycleWarning, board, find_all_cycles, group_by_epic};
use serde::Serialize;
use std::io::{self, Write};
use tracing::warn;

/// Board columns plus any `blocks` cycles found in the snapshot.
#[derive(Debug, Serialize)]
pub struct BoardOutput<'a> {
    #[serde(flatten)]
    pub board: Board<'a>,
    pub cycles: Vec<CycleWarning>,
}

fn column_title(name: &str) -> &'static str {
    match name {
        "blocked" => "Blocked",
        "ready" => "Ready",
        "in_progress" => "In Progress",
        _ => "Closed",
    }
}

fn write_board_text(out: &BoardOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    for (name, issues) in out.board.columns() {
        for &issue in issues {
            write!(w, "{name}  ")?;
            IssueRow(issue).render_table(w)?;
        }
    }
    for cycle in &out.cycles {
        writeln!(w, "cycle  {}", cycle.cycle_path.join(" -> "))?;
    }
    Ok(())
}

fn write_board_pretty(out: &BoardOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    for (i, (name, issues)) in out.board.columns().into_iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        pretty_section(w, &format!("{} ({})", column_title(name), issues.len()))?;
        if issues.is_empty() {
            writeln!(w, "  (none)")?;
        }
        for &issue in issues {
            IssueRow(issue).render_human(w)?;
        }
    }
    if !out.cycles.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Warnings")?;
        for cycle in &out.cycles {
            writeln!(w, "  {cycle}")?;
        }
    }
    Ok(())
}

pub fn run_board(tracker: &dyn IssueTracker, output: OutputMode) -> anyhow::Result<()> {
    let all = snapshot(tracker, output)?;
    let cycles = find_all_cycles(&all);
    for cycle in &cycles {
        warn!(path = ?cycle.cycle_path, "blocks cycle in snapshot");
    }
    let out = BoardOutput {
        board: board(&all),
        cycles,
    };
    render_mode(output, &out, write_board_text, write_board_pretty)
}

pub fn run_epics(tracker: &dyn IssueTracker, output: OutputMode) -> anyhow::Result<()> {
    let all = snapshot(tracker, output)?;
    let grouping = group_by_epic(&all);
    render_mode(
        output,
        &grouping,
        |g, w| {
            for group in &g.groups {
                writeln!(
                    w,
                    "epic  {}  {}/{}  {}",
                    group.epic.id, group.progress.done, group.progress.total, group.epic.title
                )?;
                for &child in &group.children {
                    write!(w, "  ")?;
                    IssueRow(child).render_table(w)?;
                }
            }
            for &issue in &g.unassigned {
                write!(w, "none  ")?;
                IssueRow(issue).render_table(w)?;
            }
            Ok(())
        },
        |g, w| {
            if g.is_empty() {
                return writeln!(w, "No issues.");
            }
            for group in &g.groups {
                pretty_section(
                    w,
                    &format!("{} {}  {}", group.epic.id, group.epic.title, group.progress),
                )?;
                if group.children.is_empty() {
                    writeln!(w, "  (no children)")?;
                }
                for &child in &group.children {
                    write!(w, "  ")?;
                    IssueRow(child).render_human(w)?;
                }
                writeln!(w)?;
            }
            if !g.unassigned.is_empty() {
                pretty_section(w, &format!("No epic ({})", g.unassigned.len()))?;
                for &issue in &g.unassigned {
                    write!(w, "  ")?;
                    IssueRow(issue).render_human(w)?;
                }
            }
            Ok(())
        },
    )
}
