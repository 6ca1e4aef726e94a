//! Cycle reporting for the `blocks` graph.
//!
//! A `blocks` cycle makes every issue on the loop permanently unready. The
//! query layer never rejects such data; it reports it. Trackers call
//! [`detect_cycle_on_add`] before persisting a new `blocks` edge and log the
//! warning, and the CLI surfaces [`find_all_cycles`] in its board output.
//!
//! Only edges whose target resolves are followed, so a dangling `blocks`
//! edge can never be part of a cycle.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn,
)]

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use super::index_by_id;
use crate::model::{DependencyType, Issue};

/// A loop in the `blocks` graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleWarning {
    /// Issue ids along the loop in edge direction. The first id is repeated
    /// at the end, so `A blocks-on B blocks-on A` is `["A", "B", "A"]`.
    pub cycle_path: Vec<String>,
    /// Declaring side of the edge that closes the loop.
    pub edge_from: String,
    /// Target side of the edge that closes the loop.
    pub edge_to: String,
}

impl CycleWarning {
    /// Distinct issues on the loop.
    pub fn cycle_len(&self) -> usize {
        self.cycle_path.len().saturating_sub(1)
    }

    pub fn is_self_loop(&self) -> bool {
        self.edge_from == self.edge_to
    }

    pub fn is_mutual_block(&self) -> bool {
        self.cycle_len() == 2
    }
}

impl fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self_loop() {
            write!(f, "cycle: {} blocks on itself", self.edge_from)
        } else if self.is_mutual_block() {
            write!(
                f,
                "cycle: {} and {} block on each other",
                self.edge_from, self.edge_to
            )
        } else {
            write!(
                f,
                "cycle of {} issues: {}",
                self.cycle_len(),
                self.cycle_path.join(" -> ")
            )
        }
    }
}

/// Resolved `blocks` targets of `id`, in declaration order.
fn blockers_of<'a>(id: &str, by_id: &HashMap<&'a str, &'a Issue>) -> Vec<&'a str> {
    by_id.get(id).map_or_else(Vec::new, |issue| {
        issue
            .edge_targets(DependencyType::Blocks)
            .filter_map(|target| by_id.get_key_value(target).map(|(id, _)| *id))
            .collect()
    })
}

/// Would adding `from blocks-on to` close a loop?
///
/// Checks the snapshot as it is *before* the edge is added. Returns the
/// loop the new edge would complete, starting and ending at `from`.
pub fn detect_cycle_on_add(all: &[Issue], from: &str, to: &str) -> Option<CycleWarning> {
    if from == to {
        return Some(CycleWarning {
            cycle_path: vec![from.to_string(), from.to_string()],
            edge_from: from.to_string(),
            edge_to: to.to_string(),
        });
    }

    let by_id = index_by_id(all);
    if !by_id.contains_key(to) {
        return None;
    }

    // Iterative DFS from `to` looking for `from`; `came_from` rebuilds the path.
    let mut came_from: HashMap<&str, &str> = HashMap::new();
    let mut stack = vec![to];
    let mut visited: HashSet<&str> = HashSet::new();
    let mut found = false;

    while let Some(current) = stack.pop() {
        if current == from {
            found = true;
            break;
        }
        if !visited.insert(current) {
            continue;
        }
        // Reverse so the first declared edge is explored first.
        for next in blockers_of(current, &by_id).into_iter().rev() {
            if !visited.contains(next) {
                came_from.entry(next).or_insert(current);
                stack.push(next);
            }
        }
    }

    if !found {
        return None;
    }

    let mut tail = vec![from.to_string()];
    let mut cursor = from;
    while cursor != to {
        match came_from.get(cursor) {
            Some(&prev) => {
                cursor = prev;
                tail.push(cursor.to_string());
            }
            None => break,
        }
    }
    tail.reverse();

    let mut cycle_path = Vec::with_capacity(tail.len() + 1);
    cycle_path.push(from.to_string());
    cycle_path.extend(tail);

    Some(CycleWarning {
        cycle_path,
        edge_from: from.to_string(),
        edge_to: to.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Every loop reachable by depth-first search, one warning per back edge.
///
/// Roots are visited in snapshot order, so the output is deterministic for a
/// given snapshot. Overlapping loops may be reported once each or folded
/// together depending on traversal order; an empty result always means the
/// `blocks` graph is acyclic. The search keeps its own stack, so chain depth
/// is bounded by memory rather than by the thread stack.
pub fn find_all_cycles(all: &[Issue]) -> Vec<CycleWarning> {
    let by_id = index_by_id(all);
    let mut color: HashMap<&str, Color> = by_id.keys().map(|id| (*id, Color::White)).collect();
    let mut warnings = Vec::new();

    for issue in all {
        let root = issue.id.as_str();
        if color.get(root) == Some(&Color::White) {
            walk(root, &by_id, &mut color, &mut warnings);
        }
    }

    warnings
}

/// Returns `true` if the `blocks` graph has any loop.
pub fn has_cycles(all: &[Issue]) -> bool {
    !find_all_cycles(all).is_empty()
}

/// One gray node on the DFS path and the next of its edges to explore.
struct Frame<'a> {
    node: &'a str,
    edges: Vec<&'a str>,
    cursor: usize,
}

impl<'a> Frame<'a> {
    fn enter(node: &'a str, by_id: &HashMap<&'a str, &'a Issue>) -> Self {
        Self {
            node,
            edges: blockers_of(node, by_id),
            cursor: 0,
        }
    }
}

fn walk<'a>(
    root: &'a str,
    by_id: &HashMap<&'a str, &'a Issue>,
    color: &mut HashMap<&'a str, Color>,
    warnings: &mut Vec<CycleWarning>,
) {
    color.insert(root, Color::Gray);
    let mut path = vec![Frame::enter(root, by_id)];

    while let Some(frame) = path.last_mut() {
        let Some(&next) = frame.edges.get(frame.cursor) else {
            color.insert(frame.node, Color::Black);
            path.pop();
            continue;
        };
        frame.cursor += 1;
        let node = frame.node;

        match color.get(next).copied() {
            Some(Color::White) => {
                color.insert(next, Color::Gray);
                path.push(Frame::enter(next, by_id));
            }
            Some(Color::Gray) => {
                // Back edge node -> next: the path holds next -> ... -> node.
                let start = path.iter().rposition(|f| f.node == next).unwrap_or(0);
                let mut cycle_path: Vec<String> =
                    path[start..].iter().map(|f| f.node.to_string()).collect();
                cycle_path.push(next.to_string());
                warnings.push(CycleWarning {
                    cycle_path,
                    edge_from: node.to_string(),
                    edge_to: next.to_string(),
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dependency;
    use chrono::Utc;

    fn issue(id: &str, blocks: &[&str]) -> Issue {
        let mut issue = Issue::new(id, id, Utc::now());
        for target in blocks {
            issue = issue.with_dependency(Dependency::blocks(*target));
        }
        issue
    }

    #[test]
    fn self_edge_is_reported_immediately() {
        let warning = detect_cycle_on_add(&[], "bd-1", "bd-1").unwrap();
        assert!(warning.is_self_loop());
        assert_eq!(warning.cycle_path, vec!["bd-1", "bd-1"]);
        assert_eq!(warning.cycle_len(), 1);
    }

    #[test]
    fn closing_edge_reports_full_loop() {
        // 2 blocks on 3, 3 blocks on 1. Adding 1 blocks on 2 closes 1->2->3->1.
        let all = vec![issue("bd-1", &[]), issue("bd-2", &["bd-3"]), issue("bd-3", &["bd-1"])];
        let warning = detect_cycle_on_add(&all, "bd-1", "bd-2").unwrap();
        assert_eq!(warning.cycle_path, vec!["bd-1", "bd-2", "bd-3", "bd-1"]);
        assert_eq!(warning.cycle_len(), 3);
        assert!(warning.to_string().contains("bd-1 -> bd-2 -> bd-3 -> bd-1"));
    }

    #[test]
    fn mutual_block_is_named() {
        let all = vec![issue("bd-1", &[]), issue("bd-2", &["bd-1"])];
        let warning = detect_cycle_on_add(&all, "bd-1", "bd-2").unwrap();
        assert!(warning.is_mutual_block());
        assert_eq!(warning.to_string(), "cycle: bd-1 and bd-2 block on each other");
    }

    #[test]
    fn acyclic_addition_is_clean() {
        let all = vec![issue("bd-1", &[]), issue("bd-2", &["bd-3"]), issue("bd-3", &[])];
        assert!(detect_cycle_on_add(&all, "bd-1", "bd-2").is_none());
        assert!(detect_cycle_on_add(&all, "bd-1", "bd-missing").is_none());
    }

    #[test]
    fn dangling_edges_never_form_cycles() {
        let all = vec![issue("bd-1", &["bd-ghost"])];
        assert!(find_all_cycles(&all).is_empty());
        assert!(detect_cycle_on_add(&all, "bd-ghost", "bd-1").is_none());
    }

    #[test]
    fn finds_existing_loops() {
        let all = vec![
            issue("bd-a", &["bd-b"]),
            issue("bd-b", &["bd-c"]),
            issue("bd-c", &["bd-a"]),
            issue("bd-d", &["bd-d"]),
            issue("bd-e", &["bd-a"]),
        ];
        let cycles = find_all_cycles(&all);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].cycle_path, vec!["bd-a", "bd-b", "bd-c", "bd-a"]);
        assert_eq!(cycles[0].edge_from, "bd-c");
        assert_eq!(cycles[0].edge_to, "bd-a");
        assert!(cycles[1].is_self_loop());
        assert_eq!(cycles[1].cycle_path, vec!["bd-d", "bd-d"]);
        assert!(has_cycles(&all));
    }

    #[test]
    fn acyclic_snapshot_has_no_cycles() {
        let all = vec![issue("bd-a", &["bd-b", "bd-c"]), issue("bd-b", &["bd-c"]), issue("bd-c", &[])];
        assert!(!has_cycles(&all));
    }
}
