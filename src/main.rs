//! # mdimport CLI
//!
//! The `mdimport` binary creates the database, imports folders of
//! frontmatter markdown, and reads back what was stored.
//!
//! ## Usage
//!
//! ```bash
//! mdimport --config ./config/mdimport.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mdimport init` | Create the SQLite database and run schema migrations |
//! | `mdimport import <folder>` | Import `<folder>/<subdir>/*.md` |
//! | `mdimport get <slug>` | Print the latest document with a slug |
//! | `mdimport domain <name>` | Create a domain or reset its password |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! mdimport init --config ./config/mdimport.toml
//!
//! # Import everything into the "travel" domain, JSON events on stderr
//! mdimport import ./content --domain travel --report json
//!
//! # Show a stored post
//! mdimport get 2020-05-01-trip.md --domain travel
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mdimport::config::{self, Config};
use mdimport::report::ReportMode;
use mdimport::{domain, get, import, logging, migrate};

/// mdimport — turn a folder of frontmatter markdown into stored documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "mdimport",
    about = "mdimport — import frontmatter markdown posts and their images into a document store",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mdimport.toml")]
    config: PathBuf,

    /// Log at debug level regardless of `[log].level`.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the domains, documents and
    /// blobs tables. Running it multiple times is safe.
    Init,

    /// Import a folder of markdown files.
    ///
    /// Every file whose name contains `.md`, one level below each
    /// subdirectory of the folder, becomes a document. Local jpg/jpeg
    /// images are stored as blobs and their links rewritten.
    Import {
        /// Folder containing one subdirectory per group of posts.
        folder: PathBuf,

        /// Domain to save into. Overrides `[import].domain`; when neither is
        /// set, each file goes to the domain named after its subdirectory.
        #[arg(long)]
        domain: Option<String>,

        /// Stop at the first file that fails instead of continuing.
        #[arg(long)]
        fail_fast: bool,

        /// Event reporting: `log` (tracing), `json` (JSON lines on stderr), or `off`.
        #[arg(long, default_value = "log", value_parser = parse_report_mode)]
        report: ReportMode,
    },

    /// Print the most recent document with a slug.
    Get {
        /// Document slug, e.g. `2020-05-01-trip.md`.
        slug: String,

        /// Only look in this domain.
        #[arg(long)]
        domain: Option<String>,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create a domain or replace its password.
    Domain {
        /// Domain name.
        name: String,

        /// Password for the domain.
        #[arg(long)]
        password: String,
    },
}

fn parse_report_mode(s: &str) -> Result<ReportMode, String> {
    ReportMode::parse(s).ok_or_else(|| format!("invalid report mode '{}': use log, json, or off", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::minimal()
    };
    logging::init(&cfg.log, cli.debug);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import {
            folder,
            domain,
            fail_fast,
            report,
        } => {
            migrate::run_migrations(&cfg)
                .await
                .context("Failed to prepare database")?;
            let reporter = report.reporter();
            let summary =
                import::run_import(&cfg, &folder, domain, fail_fast, reporter.as_ref()).await?;
            if summary.failed > 0 {
                anyhow::bail!("{} file(s) failed to import", summary.failed);
            }
        }
        Commands::Get { slug, domain, json } => {
            get::run_get(&cfg, &slug, domain.as_deref(), json).await?;
        }
        Commands::Domain { name, password } => {
            migrate::run_migrations(&cfg).await?;
            domain::run_set_domain(&cfg, &name, &password).await?;
        }
    }

    Ok(())
}
