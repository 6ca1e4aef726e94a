//! Open the configured tracker backend for a project.

use std::path::Path;

use anyhow::Result;
use beadboard_core::IssueTracker;
use beadboard_core::config::{BackendKind, ProjectConfig, resolve_project_config};
use beadboard_core::store::JsonFileStore;
use beadboard_core::tracker::{BdBridge, LocalTracker};
use tracing::debug;

/// Project config with env overrides, then the `--backend` flag on top.
pub fn effective_config(
    project_root: &Path,
    backend_flag: Option<BackendKind>,
) -> Result<ProjectConfig> {
    let mut config = resolve_project_config(project_root)?;
    if let Some(kind) = backend_flag {
        config.backend.kind = kind;
    }
    Ok(config)
}

/// The local snapshot store a project's config points at.
pub fn local_store(config: &ProjectConfig, project_root: &Path) -> JsonFileStore {
    JsonFileStore::new(config.store_path(project_root)).with_lock_timeout(config.local.lock_timeout())
}

pub fn open_tracker(config: &ProjectConfig, project_root: &Path) -> Box<dyn IssueTracker> {
    match config.backend.kind {
        BackendKind::Bridge => {
            let workdir = config.bridge_workdir(project_root);
            debug!(program = %config.bridge.program, workdir = %workdir.display(), "using bd bridge");
            Box::new(BdBridge::new(config.bridge.program.clone(), workdir))
        }
        BackendKind::Local => {
            let store = local_store(config, project_root);
            debug!(path = %store.path().display(), "using local store");
            Box::new(LocalTracker::new(store))
        }
    }
}
