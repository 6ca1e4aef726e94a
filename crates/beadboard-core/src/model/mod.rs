//! Issue data model: records, typed edges, and request shapes.

pub mod input;
pub mod issue;

pub use input::{CreateIssueInput, IssueFilter, UpdateIssueInput};
pub use issue::{
    Dependency, DependencyType, Issue, IssueStatus, IssueType, ParseEnumError, Priority,
};
