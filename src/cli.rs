use clap::{Parser, Subcommand};

/// Version stamped by the build script, falling back to the crate version.
pub const VERSION: &str = match option_env!("BUNDLES_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Top-level CLI entry point for the bundle engine.
#[derive(Parser, Debug)]
#[command(
    name = "bundles",
    about = "Declarative configuration bundle installer with snapshot rollback",
    version = VERSION
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Override the bundle root directory
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Assume yes for all confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install a bundle selection (replaces the current selection)
    Install(InstallOpts),
    /// Add bundles to the current selection
    Add(EditOpts),
    /// Remove bundles from the current selection
    Remove(EditOpts),
    /// List available bundles and their selection state
    List,
    /// Create a snapshot of the current state
    Snapshot(SnapshotOpts),
    /// List existing snapshots, newest first
    Snapshots,
    /// Roll back to a snapshot
    Rollback(RollbackOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Bundle ids to install; with none, reinstalls the current selection
    #[arg(value_name = "BUNDLE")]
    pub bundles: Vec<String>,
}

/// Options for the `add` and `remove` subcommands.
#[derive(Parser, Debug, Clone)]
pub struct EditOpts {
    /// Bundle ids to add or remove
    #[arg(value_name = "BUNDLE", required = true)]
    pub bundles: Vec<String>,
}

/// Options for the `snapshot` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SnapshotOpts {
    /// Snapshot kind label (e.g. pre-change, pre-update)
    #[arg(long, default_value = "pre-change")]
    pub kind: String,
}

/// Options for the `rollback` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RollbackOpts {
    /// Snapshot to restore: a full tag or a bare timestamp
    #[arg(value_name = "SNAPSHOT")]
    pub target: String,

    /// Also reconcile installed packages with the captured manifest
    #[arg(long)]
    pub with_packages: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
