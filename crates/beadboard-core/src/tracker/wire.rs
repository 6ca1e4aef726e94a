//! `bd --json` output shapes and their mapping into [`Issue`].
//!
//! bd prints snake_case records with RFC 3339 timestamps and its own
//! vocabulary (`issue_type`, `depends_on_id`, `parent-child`, `chore`).
//! Decoding is lenient: unknown statuses read as open, unknown types as
//! task, unknown dependency kinds are dropped, and out-of-range priorities
//! are clamped. A record without an `id` is an error.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::TrackerError;
use crate::model::{Dependency, DependencyType, Issue, IssueStatus, IssueType, Priority};

#[derive(Debug, Deserialize)]
struct WireIssue {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default, alias = "type")]
    issue_type: Option<String>,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default, alias = "createdAt")]
    created_at: Option<Value>,
    #[serde(default, alias = "updatedAt")]
    updated_at: Option<Value>,
    #[serde(default, alias = "closedAt")]
    closed_at: Option<Value>,
    #[serde(default, alias = "tags")]
    labels: Option<Vec<String>>,
    #[serde(default)]
    dependencies: Option<Vec<WireDependency>>,
}

/// bd prints edges either as `{issue_id, depends_on_id, type}` rows or, in
/// `show`, as embedded issues carrying a `dependency_type`.
#[derive(Debug, Deserialize)]
struct WireDependency {
    #[serde(default)]
    issue_id: Option<String>,
    #[serde(default, alias = "targetId", alias = "target_id")]
    depends_on_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type", alias = "dep_type", alias = "dependency_type")]
    dep_type: Option<String>,
}

fn parse_time(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn map_status(raw: Option<&str>) -> IssueStatus {
    match raw {
        None => IssueStatus::Open,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            debug!(status = raw, "unknown bd status; treating as open");
            IssueStatus::Open
        }),
    }
}

fn map_type(raw: Option<&str>) -> IssueType {
    match raw.map(str::trim) {
        None | Some("chore") => IssueType::Task,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            debug!(issue_type = raw, "unknown bd issue type; treating as task");
            IssueType::Task
        }),
    }
}

fn map_priority(raw: Option<i64>) -> Priority {
    raw.map_or_else(Priority::default, |value| {
        let clamped = value.clamp(0, i64::from(Priority::LOWEST.get()));
        u8::try_from(clamped)
            .ok()
            .and_then(Priority::new)
            .unwrap_or_default()
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl WireDependency {
    fn into_dependency(self, owner: &str) -> Option<Dependency> {
        if self.issue_id.as_deref().is_some_and(|source| source != owner) {
            // An incoming edge; bd lists these on the dependent's side too.
            return None;
        }
        let target = self.depends_on_id.or(self.id)?;
        let dep_type = match self.dep_type.as_deref() {
            None => DependencyType::Blocks,
            Some(raw) => match raw.parse() {
                Ok(dep_type) => dep_type,
                Err(_) => {
                    debug!(dep_type = raw, target_id = %target, "dropping unsupported bd dependency kind");
                    return None;
                }
            },
        };
        Some(Dependency::new(dep_type, target))
    }
}

impl WireIssue {
    fn into_issue(self) -> Issue {
        let now = Utc::now();
        let created_at = parse_time(self.created_at.as_ref()).unwrap_or(now);
        let updated_at = parse_time(self.updated_at.as_ref()).unwrap_or(created_at);
        let id = self.id;

        let dependencies = self
            .dependencies
            .unwrap_or_default()
            .into_iter()
            .filter_map(|dep| dep.into_dependency(&id))
            .collect();

        let mut issue = Issue::new(id, self.title, created_at).with_updated_at(updated_at);
        issue.description = non_blank(self.description);
        issue.status = map_status(self.status.as_deref());
        issue.issue_type = map_type(self.issue_type.as_deref());
        issue.priority = map_priority(self.priority);
        issue.assignee = non_blank(self.assignee);
        issue.dependencies = dependencies;
        issue.closed_at = parse_time(self.closed_at.as_ref());
        issue.labels = self.labels.unwrap_or_default();
        issue
    }
}

fn decode_issue(value: Value) -> Result<Issue, TrackerError> {
    serde_json::from_value::<WireIssue>(value)
        .map(WireIssue::into_issue)
        .map_err(|err| TrackerError::BridgeOutput(err.to_string()))
}

fn parse_value(stdout: &str) -> Result<Option<Value>, TrackerError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|err| TrackerError::BridgeOutput(format!("failed to parse bd output: {err}")))
}

/// Decode list-shaped output: a bare array or `{"issues": [...]}`.
///
/// Empty output and objects without an `issues` array are an empty list.
pub(super) fn parse_issue_list(stdout: &str) -> Result<Vec<Issue>, TrackerError> {
    let items = match parse_value(stdout)? {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(Value::Object(mut map)) => match map.remove("issues") {
            Some(Value::Array(items)) => items,
            _ => return Ok(Vec::new()),
        },
        Some(other) => {
            return Err(TrackerError::BridgeOutput(format!(
                "expected an issue list, got {other}"
            )));
        }
    };
    items.into_iter().map(decode_issue).collect()
}

/// Decode single-issue output: an object or a one-element array.
pub(super) fn parse_single_issue(stdout: &str, id: &str) -> Result<Issue, TrackerError> {
    match parse_value(stdout)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .next()
            .map_or_else(|| Err(TrackerError::IssueNotFound(id.to_string())), decode_issue),
        Some(value @ Value::Object(_)) => decode_issue(value),
        None => Err(TrackerError::IssueNotFound(id.to_string())),
        Some(other) => Err(TrackerError::BridgeOutput(format!(
            "expected an issue, got {other}"
        ))),
    }
}
