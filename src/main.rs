//! # charity-rag CLI
//!
//! The `charity-rag` binary converts charity records into RAG-ready text.
//!
//! ## Usage
//!
//! ```bash
//! charity-rag --config ./config/charity-rag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `charity-rag init` | Create the SQLite database and the contexts table |
//! | `charity-rag import <csv>` | Load a CSV file into the charities table |
//! | `charity-rag convert` | Convert rows into a RAG document |
//! | `charity-rag inspect` | Show columns and field coverage of a source |
//! | `charity-rag preview <index>` | Render a single row with its resolved fields |
//! | `charity-rag contexts list` | List stored documents |
//! | `charity-rag contexts get <id>` | Print a stored document |
//! | `charity-rag contexts delete <id>` | Delete a stored document |
//! | `charity-rag stats` | Summarize the database |
//!
//! ## Examples
//!
//! ```bash
//! # Convert a CSV export straight to stdout
//! charity-rag convert --csv charities.csv
//!
//! # Import into SQLite, then convert the first 500 rows and store the result
//! charity-rag init
//! charity-rag import charities.csv
//! charity-rag convert --limit 500 --store --output
//!
//! # Only health-sector charities, no overview header
//! charity-rag convert --filter Sector=Health --no-metadata
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use charity_rag::config::{self, Config};
use charity_rag::convert_cmd::{self, ConvertArgs, OutputTarget};
use charity_rag::progress::ProgressMode;
use charity_rag::sources::{select_source, ColumnFilter, RowSource};
use charity_rag::{import, migrate, stats, store};

/// charity-rag: convert charity records into natural-language paragraphs
/// for retrieval-augmented generation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. File-based commands fall back to built-in defaults when the file
/// does not exist.
#[derive(Parser)]
#[command(
    name = "charity-rag",
    about = "Convert charity records into natural-language paragraphs for RAG",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/charity-rag.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to read rows from. Without `--csv` or `--json`, rows come from
/// the configured charities table.
#[derive(Args, Clone)]
struct SourceArgs {
    /// Read rows from a CSV file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Read rows from a JSON file holding an array of objects.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Maximum number of rows to read.
    #[arg(long)]
    limit: Option<usize>,

    /// Only read rows where COLUMN equals VALUE.
    #[arg(long, value_name = "COLUMN=VALUE")]
    filter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the stored-context table.
    /// Running it more than once is safe.
    Init,

    /// Import a CSV file into the charities table.
    ///
    /// Columns are created from the CSV header; new columns in later files
    /// are added to the table.
    Import {
        /// CSV file to import.
        path: PathBuf,

        /// Drop the existing table before importing.
        #[arg(long)]
        replace: bool,
    },

    /// Convert rows into a RAG document.
    Convert {
        #[command(flatten)]
        source: SourceArgs,

        /// Rows per batch (overrides `[conversion].batch_size`).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Leave out the overview header.
        #[arg(long)]
        no_metadata: bool,

        /// Write the document to the output directory instead of stdout.
        /// Without a value, a timestamped file name is used.
        #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "")]
        output: Option<String>,

        /// Store the document in the contexts table.
        #[arg(long)]
        store: bool,

        /// Progress reporting on stderr: auto, human, json, or off.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Show the columns of a source and which columns each field reads.
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the report as JSON.
        #[arg(long)]
        json_output: bool,
    },

    /// Render one row and show the values resolved for it.
    Preview {
        /// 0-based row index.
        index: usize,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Manage stored documents.
    Contexts {
        #[command(subcommand)]
        action: ContextsAction,
    },

    /// Summarize the database.
    Stats,
}

#[derive(Subcommand)]
enum ContextsAction {
    /// List stored documents, newest first.
    List {
        /// Maximum number of entries.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Print a stored document.
    Get {
        /// Context id.
        id: String,
    },
    /// Delete a stored document.
    Delete {
        /// Context id.
        id: String,
    },
}

impl SourceArgs {
    fn build(&self, config: &Config) -> anyhow::Result<Box<dyn RowSource>> {
        let filter = self.filter.as_deref().map(ColumnFilter::parse).transpose()?;
        select_source(
            config,
            self.csv.as_deref(),
            self.json.as_deref(),
            self.limit,
            filter,
        )
    }
}

/// Load the config file, or fall back to defaults when it does not exist.
fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let cfg = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { path, replace } => {
            import::run_import(&cfg, &path, replace).await?;
        }
        Commands::Convert {
            source,
            batch_size,
            no_metadata,
            output,
            store,
            progress,
        } => {
            let output = match output {
                None => OutputTarget::Stdout,
                Some(name) if name.is_empty() => OutputTarget::AutoFile,
                Some(name) => OutputTarget::File(name),
            };
            // Stored-only runs don't need the text on stdout.
            let output = if store && output == OutputTarget::Stdout {
                OutputTarget::None
            } else {
                output
            };
            let args = ConvertArgs {
                batch_size,
                no_metadata,
                output,
                store,
                progress: ProgressMode::parse(&progress)?,
            };
            convert_cmd::run_convert(&cfg, source.build(&cfg)?, args).await?;
        }
        Commands::Inspect {
            source,
            json_output,
        } => {
            convert_cmd::run_inspect(&cfg, source.build(&cfg)?, json_output).await?;
        }
        Commands::Preview { index, source } => {
            convert_cmd::run_preview(&cfg, source.build(&cfg)?, index).await?;
        }
        Commands::Contexts { action } => match action {
            ContextsAction::List { limit } => store::run_list(&cfg, limit).await?,
            ContextsAction::Get { id } => store::run_get(&cfg, &id).await?,
            ContextsAction::Delete { id } => store::run_delete(&cfg, &id).await?,
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
