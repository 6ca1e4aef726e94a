//! `bb init`: write `.beadboard/config.toml` and optionally seed demo data.

use crate::backend::local_store;
use crate::output::{
    CliError, OutputMode, fail, fail_with_code, pretty_kv, render_error, render_mode,
};
use anyhow::Context;
use beadboard_core::config::{
    BackendKind, ENV_BD, ProjectConfig, config_error_code, config_path, save_project_config,
};
use beadboard_core::sample::seed_if_empty;
use beadboard_core::tracker::BdBridge;
use clap::Args;
use serde::Serialize;
use std::env;
use std::path::Path;
use tracing::{info, warn};

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Seed the local store with a small demo board.
    #[arg(long)]
    pub sample: bool,

    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub config_path: String,
    pub backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    pub seeded: bool,
    /// `bd --version` output, when the bridge backend was checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bd_version: Option<String>,
}

pub fn run_init(
    args: &InitArgs,
    backend: Option<BackendKind>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let path = config_path(project_root);
    if path.exists() && !args.force {
        render_error(
            output,
            &CliError::new(format!("{} already exists", path.display()))
                .with_suggestion("Pass --force to overwrite it."),
        )?;
        anyhow::bail!("project already initialized");
    }

    let mut config = ProjectConfig::default();
    config.backend.kind = backend.unwrap_or_default();

    if args.sample && config.backend.kind != BackendKind::Local {
        render_error(
            output,
            &CliError::new("--sample needs the local backend")
                .with_suggestion("Run `bb --backend local init --sample`."),
        )?;
        anyhow::bail!("--sample needs the local backend");
    }

    let written = save_project_config(project_root, &config)
        .with_context(|| format!("Failed to initialize {}", project_root.display()))?;
    info!(path = %written.display(), backend = %config.backend.kind, "wrote project config");

    let mut result = InitOutput {
        config_path: written.display().to_string(),
        backend: config.backend.kind,
        store_path: None,
        seeded: false,
        bd_version: None,
    };

    match config.backend.kind {
        BackendKind::Local => {
            let store = local_store(&config, project_root);
            result.store_path = Some(store.path().display().to_string());
            if args.sample {
                result.seeded = seed_if_empty(&store).map_err(|err| fail(output, err))?;
            }
        }
        BackendKind::Bridge => {
            // Probe the program the next commands will run, env override included.
            let mut probe = config.clone();
            probe
                .apply_overrides(None, env::var(ENV_BD).ok().as_deref())
                .map_err(|err| fail_with_code(output, config_error_code(&err), err))?;
            let bridge = BdBridge::new(probe.bridge.program, config.bridge_workdir(project_root));
            match bridge.check_health() {
                Ok(version) => result.bd_version = Some(version),
                Err(err) => warn!(error = %err, "bd is not usable yet"),
            }
        }
    }

    render_mode(
        output,
        &result,
        |r, w| {
            writeln!(w, "config\t{}", r.config_path)?;
            writeln!(w, "backend\t{}", r.backend)?;
            if let Some(store) = &r.store_path {
                writeln!(w, "store\t{store}")?;
            }
            writeln!(w, "seeded\t{}", r.seeded)
        },
        |r, w| {
            writeln!(w, "✓ Initialized .beadboard/")?;
            writeln!(w)?;
            pretty_kv(w, "Config", &r.config_path)?;
            pretty_kv(w, "Backend", r.backend.as_str())?;
            if let Some(store) = &r.store_path {
                pretty_kv(w, "Store", store)?;
            }
            if let Some(version) = &r.bd_version {
                pretty_kv(w, "bd", version)?;
            } else if r.backend == BackendKind::Bridge {
                pretty_kv(w, "bd", "not found (set BEADBOARD_BD or [bridge] program)")?;
            }
            if r.seeded {
                writeln!(w)?;
                writeln!(w, "Seeded the demo board. Try:")?;
                writeln!(w, "    bb board")?;
                writeln!(w, "    bb ready")?;
            }
            Ok(())
        },
    )
}
