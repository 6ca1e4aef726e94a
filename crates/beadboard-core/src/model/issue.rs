use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle state of an issue.
///
/// `Closed` is the single terminal state; it is the only status that
/// resolves a blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Open,
    InProgress,
    Blocked,
    #[serde(alias = "done")]
    Closed,
}

impl IssueStatus {
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Blocked, Self::Closed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` for the terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// The four kinds of issue. Epics are grouping containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Bug,
    Feature,
    #[default]
    Task,
    Epic,
}

impl IssueType {
    pub const ALL: [Self; 4] = [Self::Bug, Self::Feature, Self::Task, Self::Epic];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Task => "task",
            Self::Epic => "epic",
        }
    }

    pub const fn is_epic(self) -> bool {
        matches!(self, Self::Epic)
    }
}

/// Issue urgency, `0` (P0) most urgent through `4` (P4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Self = Self(0);
    pub const LOWEST: Self = Self(4);

    /// Build a priority, returning `None` when `value` is above P4.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::LOWEST.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for Priority {
    type Error = ParseEnumError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| ParseEnumError {
            expected: "priority (0-4)",
            got: value.to_string(),
        })
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

/// Typed edge kinds. Only `Blocks` and `Parent` drive queries; the rest
/// are carried as metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    Blocks,
    Related,
    #[serde(alias = "parent-child")]
    Parent,
    Child,
    DiscoveredFrom,
}

impl DependencyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Related => "related",
            Self::Parent => "parent",
            Self::Child => "child",
            Self::DiscoveredFrom => "discovered-from",
        }
    }
}

/// An edge owned by the issue that declares it.
///
/// `target_id` is not required to resolve; see the query functions in
/// [`crate::graph`] for how dangling targets are treated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub target_id: String,
}

impl Dependency {
    pub fn new(dep_type: DependencyType, target_id: impl Into<String>) -> Self {
        Self {
            dep_type,
            target_id: target_id.into(),
        }
    }

    pub fn blocks(target_id: impl Into<String>) -> Self {
        Self::new(DependencyType::Blocks, target_id)
    }

    pub fn parent(target_id: impl Into<String>) -> Self {
        Self::new(DependencyType::Parent, target_id)
    }

    pub fn related(target_id: impl Into<String>) -> Self {
        Self::new(DependencyType::Related, target_id)
    }
}

/// One unit of work.
///
/// Serialized with camelCase keys and epoch-millisecond timestamps, the
/// shape the local snapshot file uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "tags", skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl Issue {
    /// A fresh open task created (and last updated) at `at`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: IssueStatus::Open,
            issue_type: IssueType::Task,
            priority: Priority::default(),
            assignee: None,
            dependencies: Vec::new(),
            created_at: at,
            updated_at: at,
            closed_at: None,
            labels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = issue_type;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    #[must_use]
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at.max(self.created_at);
        self
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.status, IssueStatus::Open)
    }

    pub const fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }

    pub const fn is_epic(&self) -> bool {
        self.issue_type.is_epic()
    }

    /// Target ids of every edge of `dep_type`, in declaration order.
    pub fn edge_targets(&self, dep_type: DependencyType) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(move |dep| dep.dep_type == dep_type)
            .map(|dep| dep.target_id.as_str())
    }

    /// Returns `true` if this issue declares an edge of `dep_type` to `target_id`.
    pub fn has_edge(&self, dep_type: DependencyType, target_id: &str) -> bool {
        self.edge_targets(dep_type).any(|target| target == target_id)
    }

    /// Target of the first declared `parent` edge, resolvable or not.
    pub fn parent_id(&self) -> Option<&str> {
        self.edge_targets(DependencyType::Parent).next()
    }

    /// Bump `updated_at` to `now`, never moving it before `created_at`
    /// or backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for IssueStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "closed" | "done" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for IssueType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "bug" => Ok(Self::Bug),
            "feature" => Ok(Self::Feature),
            "task" => Ok(Self::Task),
            "epic" => Ok(Self::Epic),
            _ => Err(ParseEnumError {
                expected: "type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let digits = normalized.strip_prefix('p').unwrap_or(&normalized);
        digits
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ParseEnumError {
                expected: "priority (0-4)",
                got: s.to_string(),
            })
    }
}

impl FromStr for DependencyType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "blocks" => Ok(Self::Blocks),
            "related" => Ok(Self::Related),
            "parent" | "parent-child" => Ok(Self::Parent),
            "child" => Ok(Self::Child),
            "discovered-from" => Ok(Self::DiscoveredFrom),
            _ => Err(ParseEnumError {
                expected: "dependency type",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn enum_json_spellings() {
        assert_eq!(
            serde_json::to_string(&IssueStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(serde_json::to_string(&IssueType::Epic).unwrap(), "\"epic\"");
        assert_eq!(
            serde_json::to_string(&DependencyType::DiscoveredFrom).unwrap(),
            "\"discovered-from\""
        );
        assert_eq!(serde_json::to_string(&Priority::HIGHEST).unwrap(), "0");
    }

    #[test]
    fn legacy_spellings_are_accepted() {
        assert_eq!(
            serde_json::from_str::<IssueStatus>("\"done\"").unwrap(),
            IssueStatus::Closed
        );
        assert_eq!(
            serde_json::from_str::<DependencyType>("\"parent-child\"").unwrap(),
            DependencyType::Parent
        );
    }

    #[test]
    fn priority_out_of_range_is_rejected() {
        assert!(serde_json::from_str::<Priority>("5").is_err());
        assert!(Priority::new(5).is_none());
        assert!("P7".parse::<Priority>().is_err());
        assert_eq!("p1".parse::<Priority>().unwrap().get(), 1);
        assert_eq!("3".parse::<Priority>().unwrap().get(), 3);
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in IssueStatus::ALL {
            assert_eq!(value.to_string().parse::<IssueStatus>().unwrap(), value);
        }
        for value in IssueType::ALL {
            assert_eq!(value.to_string().parse::<IssueType>().unwrap(), value);
        }
        for raw in 0..=4u8 {
            let priority = Priority::new(raw).unwrap();
            assert_eq!(priority.to_string().parse::<Priority>().unwrap(), priority);
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!("archived".parse::<IssueStatus>().is_err());
        assert!("story".parse::<IssueType>().is_err());
        assert!("duplicates".parse::<DependencyType>().is_err());
    }

    #[test]
    fn issue_json_uses_camel_case_and_millis() {
        let issue = Issue::new("bd-a1b2", "Set up auth", at(1_700_000_000_000))
            .with_dependency(Dependency::blocks("bd-c3d4"));
        let value = serde_json::to_value(&issue).unwrap();

        assert_eq!(value["type"], "task");
        assert_eq!(value["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(value["dependencies"][0]["targetId"], "bd-c3d4");
        assert_eq!(value["dependencies"][0]["type"], "blocks");
        assert!(value.get("closedAt").is_none());
        assert!(value.get("labels").is_none());
    }

    #[test]
    fn issue_accepts_tags_spelling() {
        let raw = r#"{
            "id": "bd-e5f6",
            "title": "Add dark mode",
            "status": "open",
            "type": "feature",
            "priority": 2,
            "dependencies": [],
            "tags": ["ui"],
            "createdAt": 1000,
            "updatedAt": 2000
        }"#;
        let issue: Issue = serde_json::from_str(raw).unwrap();
        assert_eq!(issue.labels, vec!["ui".to_string()]);
        assert_eq!(issue.issue_type, IssueType::Feature);
        assert!(issue.closed_at.is_none());
    }

    #[test]
    fn parent_id_is_first_declared_parent_edge() {
        let issue = Issue::new("bd-1", "child", at(0))
            .with_dependency(Dependency::blocks("bd-9"))
            .with_dependency(Dependency::parent("bd-epic-a"))
            .with_dependency(Dependency::parent("bd-epic-b"));
        assert_eq!(issue.parent_id(), Some("bd-epic-a"));
        assert!(issue.has_edge(DependencyType::Blocks, "bd-9"));
        assert!(!issue.has_edge(DependencyType::Related, "bd-9"));
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut issue = Issue::new("bd-1", "t", at(5_000)).with_updated_at(at(9_000));
        issue.touch(at(1_000));
        assert_eq!(issue.updated_at, at(9_000));
        issue.touch(at(12_000));
        assert_eq!(issue.updated_at, at(12_000));
        assert!(issue.updated_at >= issue.created_at);
    }
}
