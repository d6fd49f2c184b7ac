//! Ripple CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ChangeArg, KindArg};

#[derive(Parser)]
#[command(name = "ripple")]
#[command(about = "Dependency impact analysis and safe editing for code repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the repository and update the dependency store
    Index {
        /// Re-analyze every file, ignoring unchanged hashes
        #[arg(short, long)]
        force: bool,

        /// Maximum number of files to scan
        #[arg(long)]
        max_files: Option<usize>,
    },
    /// Estimate the impact of changing a file
    Impact {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "modify")]
        change: ChangeArg,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what a file depends on and what depends on it
    Deps { file: PathBuf },
    /// Search indexed files by path, function, class or dependency
    Search {
        query: String,

        #[arg(short, long, value_enum, default_value = "any")]
        kind: KindArg,
    },
    /// List files structurally similar to a file
    Similar {
        file: PathBuf,

        #[arg(short, long, default_value = "0.3")]
        threshold: f64,
    },
    /// List dependencies and dependents ranked by confidence
    Related {
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        max: usize,
    },
    /// Summarize the indexed repository
    Summary,
    /// Report dependency cycles
    Cycles,
    /// Drop store entries for vanished or stale files
    Cleanup {
        /// Retention window in days (defaults to the configured value)
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// Replace a file's content through the safe-edit pipeline
    Edit {
        file: PathBuf,

        /// File holding the proposed content
        #[arg(short, long)]
        proposed: PathBuf,

        /// Apply even when validation reports blocking issues
        #[arg(short, long)]
        force: bool,

        /// Validate only, do not write
        #[arg(long)]
        check: bool,
    },
    /// Restore the file touched by an edit
    Rollback { edit_id: String },
    /// Show committed edits
    History {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// List backups recorded for a file
    Backups { file: PathBuf },
    /// Summarize the edit history of a file
    Patterns { file: PathBuf },
    /// Write the default configuration file
    Init,
    /// Remove the data directory
    Clear,
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ripple={level},ripple_core={level},ripple_indexer={level},ripple_impact={level},ripple_edit={level}",
            level = log_level
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Ripple v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Repository root: {}", cli.root.display());

    let root = cli.root;
    match cli.command {
        Commands::Index { force, max_files } => commands::index(&root, force, max_files),
        Commands::Impact { file, change, json } => commands::impact(&root, &file, change, json),
        Commands::Deps { file } => commands::deps(&root, &file),
        Commands::Search { query, kind } => commands::search(&root, &query, kind),
        Commands::Similar { file, threshold } => commands::similar(&root, &file, threshold),
        Commands::Related { file, max } => commands::related(&root, &file, max),
        Commands::Summary => commands::summary(&root),
        Commands::Cycles => commands::cycles(&root),
        Commands::Cleanup { days } => commands::cleanup(&root, days),
        Commands::Edit {
            file,
            proposed,
            force,
            check,
        } => commands::edit(&root, &file, &proposed, force, check),
        Commands::Rollback { edit_id } => commands::rollback(&root, &edit_id),
        Commands::History { file } => commands::history(&root, file.as_deref()),
        Commands::Backups { file } => commands::backups(&root, &file),
        Commands::Patterns { file } => commands::patterns(&root, &file),
        Commands::Init => commands::init(&root),
        Commands::Clear => commands::clear(&root),
        Commands::Version => {
            println!("Ripple v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
