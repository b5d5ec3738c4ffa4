//! # Takeout Harness CLI (`tko`)
//!
//! The `tko` binary is the primary interface for Takeout Harness. It
//! provides commands for database initialization, export ingestion,
//! maintenance, and starting the viewer API.
//!
//! ## Usage
//!
//! ```bash
//! tko --config ./config/takeout.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tko init` | Create the SQLite database and run schema migrations |
//! | `tko parse <path>` | Ingest an export (zip archive or extracted directory) |
//! | `tko status` | Show per-category stored-record counts |
//! | `tko clear` | Remove stored records (all, or `--category`) |
//! | `tko serve` | Start the read-only viewer API |

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use takeout_harness::{admin, config, ingest, migrate, models::Category, server, store::Store};

/// Takeout Harness, a local-first Google Takeout normalizer and viewer.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; when the file is absent, built-in defaults apply.
#[derive(Parser)]
#[command(
    name = "tko",
    about = "Takeout Harness: a local-first Google Takeout normalizer and viewer",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Optional; defaults apply when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/takeout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all record tables. Idempotent;
    /// running it multiple times is safe.
    Init,

    /// Ingest a Takeout export.
    ///
    /// Accepts either a `.zip` archive or an already-extracted directory.
    /// Every recognized source file present in the export is normalized and
    /// upserted; re-running over the same export is a no-op for records
    /// already seen.
    Parse {
        /// Export archive or directory.
        path: PathBuf,

        /// Extract and count without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show per-category stored-record counts.
    Status,

    /// Remove stored records and report how many were removed.
    Clear {
        /// Restrict to one category; all categories when omitted.
        #[arg(long)]
        category: Option<CategoryArg>,
    },

    /// Start the read-only viewer API.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// normalized records as JSON for the browser frontend.
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Watch,
    Search,
    Comments,
    Notes,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Watch => Category::Watch,
            CategoryArg::Search => Category::Search,
            CategoryArg::Comments => Category::Comments,
            CategoryArg::Notes => Category::Notes,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = Store::connect(&cfg).await?;
            migrate::run_migrations(store.pool()).await?;
            store.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Parse { path, dry_run } => {
            ingest::run_parse(&cfg, &path, dry_run).await?;
        }
        Commands::Status => {
            admin::run_status(&cfg).await?;
        }
        Commands::Clear { category } => {
            admin::run_clear(&cfg, category.map(Category::from)).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
