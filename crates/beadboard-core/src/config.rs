use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ErrorCode;
use crate::model::ParseEnumError;
use crate::tracker::DEFAULT_BD_PROGRAM;

/// Project directory holding config and the local snapshot.
pub const PROJECT_DIR: &str = ".beadboard";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_STORE_PATH: &str = ".beadboard/issues.json";
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

pub const ENV_BACKEND: &str = "BEADBOARD_BACKEND";
pub const ENV_BD: &str = "BEADBOARD_BD";

/// Which tracker backend a project uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Drive the external `bd` command.
    #[default]
    Bridge,
    /// Keep issues in a JSON snapshot under `.beadboard/`.
    Local,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bridge => "bridge",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bridge" | "bd" => Ok(Self::Bridge),
            "local" | "file" => Ok(Self::Local),
            _ => Err(ParseEnumError {
                expected: "backend (bridge, local)",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_bd_program")]
    pub program: String,
    /// Directory `bd` runs in. Relative paths resolve against the project
    /// root; absent means the project root itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: default_bd_program(),
            workdir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl LocalConfig {
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl ProjectConfig {
    /// Snapshot path for the local backend, resolved against `project_root`.
    pub fn store_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.local.path)
    }

    /// Working directory for the bridge, resolved against `project_root`.
    pub fn bridge_workdir(&self, project_root: &Path) -> PathBuf {
        self.bridge
            .workdir
            .as_ref()
            .map_or_else(|| project_root.to_path_buf(), |dir| project_root.join(dir))
    }

    /// Apply `BEADBOARD_BACKEND` / `BEADBOARD_BD` style overrides.
    pub fn apply_overrides(&mut self, backend: Option<&str>, program: Option<&str>) -> Result<()> {
        if let Some(raw) = backend.filter(|raw| !raw.trim().is_empty()) {
            self.backend.kind = raw
                .parse()
                .with_context(|| format!("Invalid {ENV_BACKEND} value"))?;
        }
        if let Some(program) = program.map(str::trim).filter(|p| !p.is_empty()) {
            self.bridge.program = program.to_string();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR).join(CONFIG_FILE)
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write `config` to `<root>/.beadboard/config.toml`, creating the directory.
pub fn save_project_config(project_root: &Path, config: &ProjectConfig) -> Result<PathBuf> {
    let path = config_path(project_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to encode project config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Project config with environment overrides applied.
pub fn resolve_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let mut config = load_project_config(project_root)?;
    let backend = env::var(ENV_BACKEND).ok();
    let program = env::var(ENV_BD).ok();
    config.apply_overrides(backend.as_deref(), program.as_deref())?;
    Ok(config)
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("beadboard/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Canonical output mode name for a config or env value.
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

/// Reject a user config whose `output` is not a known mode.
pub fn validate_user_config(config: &UserConfig) -> Result<()> {
    if let Some(raw) = config.output.as_deref() {
        if normalize_output_mode(raw).is_none() {
            bail!("Unknown output mode '{raw}' in user config (expected pretty, text or json)");
        }
    }
    Ok(())
}

/// Error code for a failure from loading, overriding or validating config.
///
/// A bad enum value (e.g. `BEADBOARD_BACKEND=sqlite`) is `InvalidEnumValue`;
/// anything else is `ConfigParseError`.
pub fn config_error_code(err: &anyhow::Error) -> ErrorCode {
    if err.downcast_ref::<ParseEnumError>().is_some() {
        ErrorCode::InvalidEnumValue
    } else {
        ErrorCode::ConfigParseError
    }
}

fn default_bd_program() -> String {
    DEFAULT_BD_PROGRAM.to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

const fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}
