#![forbid(unsafe_code)]

mod backend;
mod cmd;
mod output;

use beadboard_core::ErrorCode;
use beadboard_core::config::{
    BackendKind, config_error_code, load_user_config, validate_user_config,
};
use beadboard_core::model::ParseEnumError;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use output::{OutputMode, fail_with_code, resolve_output_mode};
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "beadboard: dependency-aware board for beads issues",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Tracker backend: bridge (drive `bd`) or local (JSON snapshot).
    #[arg(long, global = true, value_name = "BACKEND")]
    backend: Option<BackendKind>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self, user_output: Option<&str>) -> OutputMode {
        resolve_output_mode(self.format, self.json, user_output)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a beadboard project",
        long_about = "Write .beadboard/config.toml in the current directory, choosing the backend.",
        after_help = "EXAMPLES:\n    # Use the bd command (default)\n    bb init\n\n    # Local JSON store with a demo board\n    bb --backend local init --sample"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Read",
        about = "List issues",
        long_about = "List issues in display order (priority, then most recently updated).",
        after_help = "EXAMPLES:\n    # Open bugs and features\n    bb list --status open --type bug,feature\n\n    # Search titles and descriptions\n    bb list --search memory\n\n    # Emit machine-readable output\n    bb list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "List issues ready to work on",
        long_about = "List open issues with no unfinished blockers.",
        after_help = "EXAMPLES:\n    # What can I pick up?\n    bb ready\n\n    # Emit machine-readable output\n    bb ready --json"
    )]
    Ready,

    #[command(
        next_help_heading = "Read",
        about = "List blocked issues",
        long_about = "List open issues waiting on at least one unfinished blocker, with the blockers.",
        after_help = "EXAMPLES:\n    bb blocked"
    )]
    Blocked,

    #[command(
        next_help_heading = "Read",
        about = "Show one issue",
        long_about = "Show an issue with its blockers, dependents, parent, children and related issues.",
        after_help = "EXAMPLES:\n    bb show bd-a1b2\n\n    # Emit machine-readable output\n    bb show bd-a1b2 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the kanban board",
        long_about = "Show issues in Blocked, Ready, In Progress and Closed columns, and warn about blocking cycles.",
        after_help = "EXAMPLES:\n    bb board\n\n    # Emit machine-readable output\n    bb board --json"
    )]
    Board,

    #[command(
        next_help_heading = "Read",
        about = "Group issues by epic",
        long_about = "Show every epic with its children and progress, then issues without a parent.",
        after_help = "EXAMPLES:\n    bb epics"
    )]
    Epics,

    #[command(
        next_help_heading = "Write",
        about = "Create an issue",
        long_about = "Create an issue, optionally under a parent and waiting on other issues.",
        after_help = "EXAMPLES:\n    # Create a task\n    bb create \"Fix login timeout\"\n\n    # A P1 bug under an epic, waiting on another issue\n    bb create \"Token refresh fails\" -t bug -p 1 --parent bd-k1l2 --blocked-by bd-a1b2"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Write",
        about = "Update an issue",
        long_about = "Change one or more fields of an issue.",
        after_help = "EXAMPLES:\n    # Start work\n    bb update bd-c3d4 --status in_progress --assignee agent\n\n    # Replace labels\n    bb update bd-c3d4 --labels perf,backend"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Write",
        about = "Close issues",
        long_about = "Set one or more issues to closed.",
        after_help = "EXAMPLES:\n    bb close bd-a1b2\n\n    bb close bd-a1b2 bd-c3d4"
    )]
    Close(cmd::update::CloseArgs),

    #[command(
        next_help_heading = "Write",
        about = "Delete an issue",
        long_about = "Delete an issue. Edges pointing at it are left dangling.",
        after_help = "EXAMPLES:\n    bb delete bd-g7h8"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Write",
        about = "Manage dependencies between issues",
        after_help = "EXAMPLES:\n    # bd-c3d4 waits on bd-a1b2\n    bb dep add bd-c3d4 --blocks bd-a1b2\n\n    # Remove it again\n    bb dep rm bd-c3d4 bd-a1b2"
    )]
    Dep(cmd::dep::DepArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BEADBOARD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "bb=debug,beadboard_core=debug,info"
        } else {
            "bb=info,beadboard_core=info,warn"
        })
    });

    let format = env::var("BEADBOARD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Returns `true` when clap rejected a value because it is not a known
/// status, type, priority or backend.
fn is_enum_value_error(err: &clap::Error) -> bool {
    err.kind() == ErrorKind::ValueValidation
        && std::error::Error::source(err).is_some_and(|source| source.is::<ParseEnumError>())
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if is_enum_value_error(&err) => {
            let _ = err.print();
            let code = ErrorCode::InvalidEnumValue;
            eprintln!("  code: {code}");
            if let Some(hint) = code.hint() {
                eprintln!("  suggestion: {hint}");
            }
            std::process::exit(err.exit_code());
        }
        Err(err) => err.exit(),
    }
}

/// Report a config failure with its error code.
fn config_failure(output: OutputMode, err: anyhow::Error) -> anyhow::Error {
    let code = config_error_code(&err);
    fail_with_code(output, code, err)
}

fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user_config = load_user_config()
        .and_then(|config| validate_user_config(&config).map(|()| config))
        .map_err(|err| config_failure(cli.output_mode(None), err))?;
    let output = cli.output_mode(user_config.output.as_deref());
    let project_root = env::current_dir()?;

    if let Commands::Init(args) = &cli.command {
        return cmd::init::run_init(args, cli.backend, output, &project_root);
    }

    let config = backend::effective_config(&project_root, cli.backend)
        .map_err(|err| config_failure(output, err))?;
    let tracker = backend::open_tracker(&config, &project_root);
    let tracker = tracker.as_ref();
    debug!(backend = tracker.backend_name(), ?output, "dispatching command");

    match &cli.command {
        Commands::Init(_) => Ok(()),
        Commands::List(args) => cmd::list::run_list(args, tracker, output),
        Commands::Ready => cmd::list::run_ready(tracker, output),
        Commands::Blocked => cmd::list::run_blocked(tracker, output),
        Commands::Show(args) => cmd::show::run_show(args, tracker, output),
        Commands::Board => cmd::board::run_board(tracker, output),
        Commands::Epics => cmd::board::run_epics(tracker, output),
        Commands::Create(args) => cmd::create::run_create(args, tracker, output),
        Commands::Update(args) => cmd::update::run_update(args, tracker, output),
        Commands::Close(args) => cmd::update::run_close(args, tracker, output),
        Commands::Delete(args) => cmd::delete::run_delete(args, tracker, output),
        Commands::Dep(args) => cmd::dep::run_dep(args, tracker, output),
    }
}
