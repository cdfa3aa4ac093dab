//! # Creature Catalog CLI (`catalog`)
//!
//! ## Usage
//!
//! ```bash
//! catalog --config ./config/catalog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog init` | Create the SQLite database and schema |
//! | `catalog import <file>` | Replace the catalog from a CSV file |
//! | `catalog list` | Filtered, paginated listing |
//! | `catalog get <id>` | Show one entry |
//! | `catalog favorites --user <id>` | A user's favorites, newest first |
//! | `catalog toggle <id> --user <id>` | Toggle a favorite |
//! | `catalog serve` | Start the HTTP server |
//!
//! Logs go to stderr and honor `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_core::query::ListQuery;
use creature_catalog::{catalog, config, ingest, migrate, server};

/// Creature Catalog CLI: import, browse, and favorite catalog entries.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/catalog.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "catalog", version, about = "Creature catalog: CSV import, browsing, and favorites")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Replace the whole catalog from a CSV file.
    ///
    /// Existing entries and every user's favorites are removed in the same
    /// transaction. A malformed file leaves the catalog untouched.
    Import {
        /// Path to the CSV file (first row is the header).
        file: PathBuf,
    },

    /// List catalog entries ordered by name.
    List {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        limit: Option<String>,
        /// Case-insensitive substring over name and both types.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        type1: Option<String>,
        #[arg(long)]
        type2: Option<String>,
        #[arg(long)]
        generation: Option<String>,
        /// `true` or `false`.
        #[arg(long)]
        legendary: Option<String>,
        /// Annotate entries with this user's favorite status.
        #[arg(long)]
        user: Option<String>,
    },

    /// Show one entry by id.
    Get {
        id: String,
        #[arg(long)]
        user: Option<String>,
    },

    /// List a user's favorites, most recent first.
    Favorites {
        #[arg(long)]
        user: String,
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        limit: Option<String>,
    },

    /// Toggle an entry in a user's favorites.
    Toggle {
        id: String,
        #[arg(long)]
        user: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            ingest::run_import(&cfg, &file).await?;
        }
        Commands::List {
            page,
            limit,
            search,
            type1,
            type2,
            generation,
            legendary,
            user,
        } => {
            let params = ListQuery {
                page,
                limit,
                search,
                type1,
                type2,
                generation,
                legendary,
            };
            catalog::run_list(&cfg, params, user.as_deref()).await?;
        }
        Commands::Get { id, user } => {
            catalog::run_get(&cfg, &id, user.as_deref()).await?;
        }
        Commands::Favorites { user, page, limit } => {
            catalog::run_favorites(&cfg, &user, page, limit).await?;
        }
        Commands::Toggle { id, user } => {
            catalog::run_toggle(&cfg, &id, &user).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
