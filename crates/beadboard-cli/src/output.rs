//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for agents, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config (`~/.config/beadboard/config.toml`)
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use beadboard_core::config::normalize_output_mode;
use beadboard_core::{ErrorCode, Issue, TrackerError};
use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, columns, visual framing).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn from_canonical(name: &str) -> Option<Self> {
        match name {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn parse_mode(raw: &str) -> Option<OutputMode> {
    normalize_output_mode(raw).and_then(OutputMode::from_canonical)
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next tier.
    if let Some(mode) = format_env.and_then(parse_mode) {
        return mode;
    }
    if let Some(mode) = user_output.and_then(parse_mode) {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, user config and
/// TTY defaults.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    user_output: Option<&str>,
) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), user_output, is_tty)
}

/// Trait implemented by any CLI result type that can be rendered in all modes.
pub trait Renderable {
    /// Render for human consumption.
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single JSON value.
    fn render_json(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single text row, fields in [`Renderable::table_headers`] order.
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// One issue as a list row.
pub struct IssueRow<'a>(pub &'a Issue);

impl Renderable for IssueRow<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let issue = self.0;
        write!(
            w,
            "{:<10} {} {:<7} {:<11} {}",
            issue.id, issue.priority, issue.issue_type, issue.status, issue.title
        )?;
        if let Some(assignee) = &issue.assignee {
            write!(w, "  @{assignee}")?;
        }
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let issue = self.0;
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            issue.id,
            issue.priority.get(),
            issue.issue_type,
            issue.status,
            issue.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "PRI", "TYPE", "STATUS", "TITLE"]
    }
}

/// Write a list of [`Renderable`] items.
///
/// - In JSON mode, wraps items in a JSON array.
/// - In text mode, prints a header row first when there are items.
pub fn write_list<R: Renderable>(
    w: &mut dyn Write,
    items: &[R],
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => {
            for item in items {
                item.render_human(w)?;
            }
        }
        OutputMode::Text => {
            if !items.is_empty() && !R::table_headers().is_empty() {
                writeln!(w, "{}", R::table_headers().join("  "))?;
            }
            for item in items {
                item.render_table(w)?;
            }
        }
        OutputMode::Json => {
            write!(w, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(w, ",")?;
                }
                writeln!(w)?;
                item.render_json(w)?;
            }
            if !items.is_empty() {
                writeln!(w)?;
            }
            writeln!(w, "]")?;
        }
    }
    Ok(())
}

/// Render a list of [`Renderable`] items to stdout.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_list(&mut out, items, mode)
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl From<&TrackerError> for CliError {
    fn from(err: &TrackerError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

fn write_error(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(w, "error[{code}]: {}", error.message)?,
                None => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

/// Report a tracker failure and turn it into the command's error.
pub fn fail(mode: OutputMode, err: TrackerError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, &CliError::from(&err)) {
        return render_err;
    }
    anyhow::Error::new(err)
}

/// Report a failure that has no [`TrackerError`] behind it under `code`.
pub fn fail_with_code(mode: OutputMode, code: ErrorCode, err: anyhow::Error) -> anyhow::Error {
    let error = CliError {
        message: format!("{err:#}"),
        suggestion: code.hint().map(str::to_string),
        error_code: Some(code.code().to_string()),
    };
    if let Err(render_err) = render_error(mode, &error) {
        return render_err;
    }
    err
}

/// Render a success message to stdout.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "ok": true,
                "message": message,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "✓ {message}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn issue() -> Issue {
        Issue::new("bd-a1b2", "Set up auth", Utc::now())
    }

    #[test]
    fn format_flag_wins_over_everything() {
        let mode =
            resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), Some("json"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), None, true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn env_wins_over_user_config() {
        let mode = resolve_output_mode_inner(None, false, Some("TEXT"), Some("json"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn user_config_applies_with_legacy_aliases() {
        let mode = resolve_output_mode_inner(None, false, None, Some("human"), false);
        assert_eq!(mode, OutputMode::Pretty);
        let mode = resolve_output_mode_inner(None, false, Some("fancy"), Some("table"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn default_follows_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, false, None, None, true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("fancy"), None, false),
            OutputMode::Text
        );
    }

    #[test]
    fn issue_row_text_has_headers() {
        let issues = [issue()];
        let rows: Vec<_> = issues.iter().map(IssueRow).collect();
        let mut buf = Vec::new();
        write_list(&mut buf, &rows, OutputMode::Text).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.starts_with("ID  PRI  TYPE  STATUS  TITLE\n"));
        assert!(s.contains("bd-a1b2  2  task  open  Set up auth"));
    }

    #[test]
    fn issue_list_json_is_an_array() {
        let issues = [issue(), issue()];
        let rows: Vec<_> = issues.iter().map(IssueRow).collect();
        let mut buf = Vec::new();
        write_list(&mut buf, &rows, OutputMode::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["id"], "bd-a1b2");

        let mut empty = Vec::new();
        write_list::<IssueRow<'_>>(&mut empty, &[], OutputMode::Json).unwrap();
        assert_eq!(String::from_utf8(empty).unwrap(), "[]\n");
    }

    #[test]
    fn pretty_row_shows_assignee() {
        let mut issue = issue();
        issue.assignee = Some("agent".into());
        let mut buf = Vec::new();
        IssueRow(&issue).render_human(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.contains("P2"));
        assert!(s.trim_end().ends_with("@agent"));
    }

    #[test]
    fn tracker_errors_carry_codes_and_hints() {
        let err = TrackerError::IssueNotFound("bd-zzzz".into());
        let cli = CliError::from(&err);
        assert!(cli.message.contains("bd-zzzz"));
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));

        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Text, &cli).unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("error[E2001]: issue not found: bd-zzzz"));

        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Json, &cli).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["error"]["error_code"], "E2001");
    }

    #[test]
    fn cli_error_simple() {
        let err = CliError::new("something went wrong");
        assert!(err.suggestion.is_none());
        assert!(err.error_code.is_none());
    }
}
