use std::sync::{Mutex, MutexGuard};

use super::SnapshotStore;
use crate::error::TrackerError;
use crate::model::Issue;

/// Mutex-guarded in-process snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    issues: Mutex<Vec<Issue>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `issues`.
    #[must_use]
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Issue>> {
        // A panic while holding the lock cannot leave a half-written Vec.
        self.issues
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> Result<Vec<Issue>, TrackerError> {
        Ok(self.guard().clone())
    }

    fn write(&self, issues: &[Issue]) -> Result<(), TrackerError> {
        *self.guard() = issues.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), TrackerError> {
        self.guard().clear();
        Ok(())
    }

    /// Holds the mutex for the whole read-modify-write.
    fn mutate<T, F>(&self, f: F) -> Result<T, TrackerError>
    where
        F: FnOnce(&mut Vec<Issue>) -> Result<T, TrackerError>,
    {
        let mut guard = self.guard();
        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        drop(guard);
        Ok(value)
    }
}
