use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use super::IssueTracker;
use super::wire::{parse_issue_list, parse_single_issue};
use crate::error::TrackerError;
use crate::graph::apply_filter;
use crate::model::{
    CreateIssueInput, Dependency, DependencyType, Issue, IssueFilter, UpdateIssueInput,
};

/// Default program name for the bridge.
pub const DEFAULT_BD_PROGRAM: &str = "bd";

/// Tracker that drives the external `bd` command.
///
/// Every call spawns `bd <args> --json` in `workdir` and waits for it.
/// Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct BdBridge {
    program: String,
    workdir: PathBuf,
}

impl BdBridge {
    pub fn new(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run `bd --version` and return its trimmed output.
    pub fn check_health(&self) -> Result<String, TrackerError> {
        let stdout = self.exec(&["--version".to_string()], false)?;
        Ok(stdout.trim().to_string())
    }

    fn run(&self, args: &[String]) -> Result<String, TrackerError> {
        self.exec(args, true)
    }

    fn exec(&self, args: &[String], json: bool) -> Result<String, TrackerError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if json {
            command.arg("--json");
        }

        debug!(program = %self.program, ?args, "spawning bd");
        let output = command.output().map_err(|source| TrackerError::BridgeSpawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                output.status.code().map_or_else(
                    || "bd command terminated by signal".to_string(),
                    |code| format!("bd command failed with code {code}"),
                )
            } else {
                stderr.trim().to_string()
            };
            debug!(program = %self.program, ?args, %message, "bd failed");
            return Err(TrackerError::Bridge(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `list` arguments. bd takes a single value per flag, so multi-valued
/// filters are narrowed client-side instead.
pub(super) fn list_args(filter: &IssueFilter) -> Vec<String> {
    let mut args = vec!["list".to_string()];
    if let [status] = filter.statuses.as_slice() {
        args.extend(["--status".to_string(), status.to_string()]);
    }
    if let [priority] = filter.priorities.as_slice() {
        args.extend(["--priority".to_string(), priority.get().to_string()]);
    }
    if let Some(assignee) = &filter.assignee {
        args.extend(["--assignee".to_string(), assignee.clone()]);
    }
    args
}

pub(super) fn create_args(input: &CreateIssueInput) -> Vec<String> {
    let mut args = vec!["create".to_string(), input.title.clone()];
    if let Some(description) = input.description.as_deref().filter(|d| !d.is_empty()) {
        args.extend(["-d".to_string(), description.to_string()]);
    }
    if let Some(issue_type) = input.issue_type {
        args.extend(["-t".to_string(), issue_type.to_string()]);
    }
    if let Some(priority) = input.priority {
        args.extend(["-p".to_string(), priority.get().to_string()]);
    }
    if let Some(assignee) = input.assignee.as_deref().filter(|a| !a.is_empty()) {
        args.extend(["-a".to_string(), assignee.to_string()]);
    }
    if !input.labels.is_empty() {
        args.extend(["-l".to_string(), input.labels.join(",")]);
    }
    args
}

/// `update` arguments, or `None` when nothing would change.
pub(super) fn update_args(
    id: &str,
    update: &UpdateIssueInput,
) -> Result<Option<Vec<String>>, TrackerError> {
    if update.issue_type.is_some() {
        return Err(TrackerError::Unsupported {
            backend: "bridge",
            operation: "changing the issue type",
        });
    }
    if update.labels.is_some() {
        return Err(TrackerError::Unsupported {
            backend: "bridge",
            operation: "replacing labels",
        });
    }

    let mut args = vec!["update".to_string(), id.to_string()];
    if let Some(status) = update.status {
        args.extend(["-s".to_string(), status.to_string()]);
    }
    if let Some(priority) = update.priority {
        args.extend(["-p".to_string(), priority.get().to_string()]);
    }
    if let Some(assignee) = update.assignee.as_deref().filter(|a| !a.is_empty()) {
        args.extend(["-a".to_string(), assignee.to_string()]);
    }
    if let Some(title) = update.title.as_deref().filter(|t| !t.is_empty()) {
        args.extend(["--title".to_string(), title.to_string()]);
    }
    if let Some(description) = update.description.as_deref().filter(|d| !d.is_empty()) {
        args.extend(["-d".to_string(), description.to_string()]);
    }

    Ok((args.len() > 2).then_some(args))
}

pub(super) fn link_args(id: &str, dependency: &Dependency) -> Result<Vec<String>, TrackerError> {
    let flag = match dependency.dep_type {
        DependencyType::Blocks => "--blocks",
        DependencyType::Parent => "--parent",
        DependencyType::Related => "--related",
        DependencyType::Child | DependencyType::DiscoveredFrom => {
            return Err(TrackerError::Unsupported {
                backend: "bridge",
                operation: "child and discovered-from links",
            });
        }
    };
    Ok(vec![
        "link".to_string(),
        id.to_string(),
        flag.to_string(),
        dependency.target_id.clone(),
    ])
}

impl IssueTracker for BdBridge {
    fn backend_name(&self) -> &'static str {
        "bridge"
    }

    fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, TrackerError> {
        let issues = parse_issue_list(&self.run(&list_args(filter))?)?;
        if filter.is_empty() {
            return Ok(issues);
        }
        Ok(apply_filter(filter, &issues).into_iter().cloned().collect())
    }

    fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        let stdout = self.run(&["show".to_string(), id.to_string()])?;
        parse_single_issue(&stdout, id)
    }

    fn create_issue(&self, input: &CreateIssueInput) -> Result<Issue, TrackerError> {
        if input.title.trim().is_empty() {
            return Err(TrackerError::InvalidInput("title must not be empty".into()));
        }
        let stdout = self.run(&create_args(input))?;
        if stdout.trim().is_empty() {
            return Err(TrackerError::BridgeOutput(
                "bd create printed no issue".to_string(),
            ));
        }
        parse_single_issue(&stdout, &input.title)
    }

    fn update_issue(&self, id: &str, update: &UpdateIssueInput) -> Result<Issue, TrackerError> {
        if let Some(args) = update_args(id, update)? {
            self.run(&args)?;
        }
        self.get_issue(id)
    }

    fn delete_issue(&self, id: &str) -> Result<(), TrackerError> {
        self.run(&["delete".to_string(), id.to_string(), "-f".to_string()])?;
        Ok(())
    }

    fn add_dependency(&self, id: &str, dependency: &Dependency) -> Result<(), TrackerError> {
        self.run(&link_args(id, dependency)?)?;
        Ok(())
    }

    fn remove_dependency(&self, _id: &str, _target_id: &str) -> Result<(), TrackerError> {
        Err(TrackerError::Unsupported {
            backend: "bridge",
            operation: "remove_dependency",
        })
    }

    fn ready_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        parse_issue_list(&self.run(&["ready".to_string()])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueStatus, IssueType, Priority};

    #[test]
    fn list_args_pass_single_valued_filters_only() {
        let filter = IssueFilter {
            statuses: vec![IssueStatus::InProgress],
            priorities: vec![Priority::HIGHEST, Priority::LOWEST],
            assignee: Some("agent".into()),
            ..IssueFilter::default()
        };
        assert_eq!(
            list_args(&filter),
            vec!["list", "--status", "in_progress", "--assignee", "agent"]
        );
        assert_eq!(list_args(&IssueFilter::default()), vec!["list"]);
    }

    #[test]
    fn create_args_follow_bd_flags() {
        let input = CreateIssueInput {
            title: "Add dark mode".into(),
            description: Some("Theme toggle".into()),
            issue_type: Some(IssueType::Feature),
            priority: Some(Priority::new(3).unwrap()),
            assignee: None,
            labels: vec!["ui".into(), "theme".into()],
        };
        assert_eq!(
            create_args(&input),
            vec![
                "create",
                "Add dark mode",
                "-d",
                "Theme toggle",
                "-t",
                "feature",
                "-p",
                "3",
                "-l",
                "ui,theme"
            ]
        );
    }

    #[test]
    fn empty_update_skips_the_update_call() {
        assert!(update_args("bd-1", &UpdateIssueInput::default()).unwrap().is_none());

        let update = UpdateIssueInput {
            status: Some(IssueStatus::Closed),
            title: Some("Renamed".into()),
            ..UpdateIssueInput::default()
        };
        assert_eq!(
            update_args("bd-1", &update).unwrap().unwrap(),
            vec!["update", "bd-1", "-s", "closed", "--title", "Renamed"]
        );
    }

    #[test]
    fn unsupported_updates_are_rejected_up_front() {
        let update = UpdateIssueInput {
            issue_type: Some(IssueType::Bug),
            ..UpdateIssueInput::default()
        };
        assert!(matches!(
            update_args("bd-1", &update),
            Err(TrackerError::Unsupported { .. })
        ));
    }

    #[test]
    fn link_args_map_dependency_kinds() {
        assert_eq!(
            link_args("bd-1", &Dependency::parent("bd-e")).unwrap(),
            vec!["link", "bd-1", "--parent", "bd-e"]
        );
        assert!(link_args("bd-1", &Dependency::new(DependencyType::Child, "bd-2")).is_err());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let bridge = BdBridge::new("beadboard-no-such-bd-binary", ".");
        let err = bridge.list_issues(&IssueFilter::default()).unwrap_err();
        assert!(matches!(err, TrackerError::BridgeSpawn { .. }));
        assert!(bridge.check_health().is_err());
    }

    #[test]
    fn remove_dependency_is_unsupported() {
        let bridge = BdBridge::new("bd", ".");
        assert!(matches!(
            bridge.remove_dependency("bd-1", "bd-2"),
            Err(TrackerError::Unsupported { .. })
        ));
    }
}
