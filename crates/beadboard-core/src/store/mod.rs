//! Snapshot persistence.
//!
//! A store holds one whole snapshot: the ordered list of every issue. There
//! is no per-issue addressing; callers read the full list, change it, and
//! write the full list back. [`SnapshotStore::mutate`] packages that cycle
//! so implementations can make it atomic.
//!
//! - [`MemoryStore`]: process-local, for tests and throwaway sessions.
//! - [`JsonFileStore`]: a pretty-printed JSON array on disk.

mod file;
mod memory;

pub use file::{JsonFileStore, lock_path_for};
pub use memory::MemoryStore;

use crate::error::TrackerError;
use crate::model::Issue;

/// Read/write/clear access to a full snapshot.
pub trait SnapshotStore: Send + Sync {
    /// The current snapshot. An uninitialized store reads as empty.
    fn read(&self) -> Result<Vec<Issue>, TrackerError>;

    /// Replace the snapshot with `issues`.
    fn write(&self, issues: &[Issue]) -> Result<(), TrackerError>;

    /// Drop every issue.
    fn clear(&self) -> Result<(), TrackerError>;

    /// Read, apply `f`, and write back if `f` succeeds.
    ///
    /// When `f` returns an error nothing is written and the previous
    /// snapshot stays in place. The default implementation is not atomic
    /// across processes; [`JsonFileStore`] overrides it with a locked
    /// version.
    fn mutate<T, F>(&self, f: F) -> Result<T, TrackerError>
    where
        F: FnOnce(&mut Vec<Issue>) -> Result<T, TrackerError>,
        Self: Sized,
    {
        let mut issues = self.read()?;
        let value = f(&mut issues)?;
        self.write(&issues)?;
        Ok(value)
    }
}
