//! beadboard-core library.
//!
//! Issue model, the dependency query engine over issue snapshots, and the
//! tracker backends (a local JSON store and a bridge to the `bd` command).
//!
//! # Conventions
//!
//! - **Errors**: Tracker and store operations return [`error::TrackerError`];
//!   configuration loading uses `anyhow::Result`. The query engine in
//!   [`graph`] never errors.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod id;
pub mod lock;
pub mod model;
pub mod sample;
pub mod store;
pub mod tracker;

pub use error::{ErrorCode, TrackerError};
pub use model::{
    CreateIssueInput, Dependency, DependencyType, Issue, IssueFilter, IssueStatus, IssueType,
    Priority, UpdateIssueInput,
};
pub use tracker::{BdBridge, IssueTracker, LocalTracker, ready_issues_or_local};
