use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::SnapshotStore;
use crate::error::TrackerError;
use crate::lock::StoreLock;
use crate::model::Issue;

/// Default wait for the store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// `<path>.lock`, the advisory lock file guarding `path`.
#[must_use]
pub fn lock_path_for(path: &Path) -> PathBuf {
    with_suffix(path, ".lock")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Snapshot kept as a pretty-printed JSON array on disk.
///
/// Writes land in `<path>.tmp` and are renamed over `path`, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Returns `true` once a snapshot file has been written.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<Vec<Issue>, TrackerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot file yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let issues: Vec<Issue> =
            serde_json::from_str(&content).map_err(|source| TrackerError::Json {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), count = issues.len(), "snapshot loaded");
        Ok(issues)
    }

    fn store(&self, issues: &[Issue]) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut encoded =
            serde_json::to_vec_pretty(issues).map_err(|source| TrackerError::Json {
                path: self.path.clone(),
                source,
            })?;
        encoded.push(b'\n');

        let tmp = with_suffix(&self.path, ".tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), count = issues.len(), "snapshot written");
        Ok(())
    }
}

impl SnapshotStore for JsonFileStore {
    fn read(&self) -> Result<Vec<Issue>, TrackerError> {
        self.load()
    }

    fn write(&self, issues: &[Issue]) -> Result<(), TrackerError> {
        let _lock = StoreLock::acquire(&lock_path_for(&self.path), self.lock_timeout)?;
        self.store(issues)
    }

    fn clear(&self) -> Result<(), TrackerError> {
        self.write(&[])
    }

    /// Holds the store lock across read, `f`, and write.
    fn mutate<T, F>(&self, f: F) -> Result<T, TrackerError>
    where
        F: FnOnce(&mut Vec<Issue>) -> Result<T, TrackerError>,
    {
        let _lock = StoreLock::acquire(&lock_path_for(&self.path), self.lock_timeout)?;
        let mut issues = self.load()?;
        let value = f(&mut issues)?;
        self.store(&issues)?;
        Ok(value)
    }
}
