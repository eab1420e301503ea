//! Conversion command orchestration.
//!
//! Coordinates the full `convert` flow: source → normalization → header +
//! batches → stdout / file / `rag_contexts` table. The conversion itself is
//! synchronous; only loading and storing touch the database.

use anyhow::Result;
use chrono::{Local, Utc};
use std::path::PathBuf;
use std::time::Instant;

use crate::batch::validate_batch_size;
use crate::config::Config;
use crate::convert::{build_document, FormatOptions, RagDocument};
use crate::db;
use crate::export::{format_elapsed, generate_filename, save_text_to_file};
use crate::inspect::{inspect_rows, preview_row, print_report};
use crate::progress::{ConvertProgressEvent, ConvertProgressReporter, ProgressMode};
use crate::sources::RowSource;
use crate::store::{store_context, ContextMetadata};

/// Where the generated document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Print to stdout.
    Stdout,
    /// Write to a timestamped file in the configured output directory.
    AutoFile,
    /// Write to this file name inside the configured output directory.
    File(String),
    /// Only report a summary.
    None,
}

#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub batch_size: Option<usize>,
    pub no_metadata: bool,
    pub output: OutputTarget,
    pub store: bool,
    pub progress: ProgressMode,
}

/// Outcome of a conversion run, as reported to the user.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub document: RagDocument,
    pub text: String,
    pub written_to: Option<PathBuf>,
    pub stored_id: Option<(String, bool)>,
}

pub fn resolve_options(config: &Config, args: &ConvertArgs) -> Result<FormatOptions> {
    let mut options = config.format_options();
    if let Some(size) = args.batch_size {
        options.batch_size = size;
    }
    if args.no_metadata {
        options.include_metadata = false;
    }
    validate_batch_size(options.batch_size)?;
    Ok(options)
}

/// Load, convert, and deliver. Returns the outcome for callers that want
/// to inspect it.
pub async fn convert(
    config: &Config,
    source: &dyn RowSource,
    args: &ConvertArgs,
    progress: &dyn ConvertProgressReporter,
) -> Result<ConvertOutcome> {
    let options = resolve_options(config, args)?;
    let aliases = config.field_aliases()?;

    progress.report(ConvertProgressEvent::Loading {
        source: source.describe(),
    });
    let rows = source.load().await?;
    tracing::info!(source = %source.describe(), rows = rows.len(), "rows loaded");

    let document = build_document(&rows, &aliases, options, progress)?;
    let text = document.render();

    let written_to = match &args.output {
        OutputTarget::AutoFile => {
            let name = generate_filename(&config.output.file_prefix, "txt", Local::now());
            Some(save_text_to_file(&config.output.dir, &name, &text)?)
        }
        OutputTarget::File(name) => Some(save_text_to_file(&config.output.dir, name, &text)?),
        OutputTarget::Stdout | OutputTarget::None => None,
    };

    let stored_id = if args.store {
        let metadata = ContextMetadata {
            record_count: document.record_count,
            fault_count: document.fault_count,
            batch_count: document.batches.len(),
            batch_size: options.batch_size,
            include_metadata: options.include_metadata,
            source: source.describe(),
            generated_at: Utc::now(),
        };
        let pool = db::connect(config).await?;
        crate::migrate::ensure_contexts_table(&pool, &config.tables.rag_contexts).await?;
        let stored = store_context(&pool, &config.tables.rag_contexts, &text, &metadata).await;
        pool.close().await;
        Some(stored?)
    } else {
        None
    };

    Ok(ConvertOutcome {
        document,
        text,
        written_to,
        stored_id,
    })
}

/// CLI entry point for `charity-rag convert`.
pub async fn run_convert(
    config: &Config,
    source: Box<dyn RowSource>,
    args: ConvertArgs,
) -> Result<()> {
    let started = Instant::now();
    let reporter = args.progress.reporter();
    let outcome = convert(config, source.as_ref(), &args, reporter.as_ref()).await?;
    let elapsed = started.elapsed();

    if args.output == OutputTarget::Stdout {
        println!("{}", outcome.text);
        // Keep stdout clean for piping; the summary goes to stderr.
        eprintln!(
            "converted {} records in {}",
            outcome.document.record_count,
            format_elapsed(elapsed)
        );
        return Ok(());
    }

    let doc = &outcome.document;
    println!("convert {}", source.describe());
    println!("  records: {}", doc.record_count);
    if doc.fault_count > 0 {
        println!("  records with errors: {}", doc.fault_count);
    }
    println!("  batches: {}", doc.batches.len());
    println!("  characters: {}", outcome.text.chars().count());
    println!("  elapsed: {}", format_elapsed(elapsed));
    if let Some(ref path) = outcome.written_to {
        println!("  written to: {}", path.display());
    }
    if let Some((ref id, inserted)) = outcome.stored_id {
        if inserted {
            println!("  stored context: {}", id);
        } else {
            println!("  stored context: {} (unchanged)", id);
        }
    }
    println!("ok");
    Ok(())
}

/// CLI entry point for `charity-rag inspect`.
pub async fn run_inspect(config: &Config, source: Box<dyn RowSource>, json: bool) -> Result<()> {
    let aliases = config.field_aliases()?;
    let rows = source.load().await?;
    let report = inspect_rows(&rows, &aliases);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("inspect {}", source.describe());
        print_report(&report);
    }
    Ok(())
}

/// CLI entry point for `charity-rag preview`.
pub async fn run_preview(config: &Config, source: Box<dyn RowSource>, index: usize) -> Result<()> {
    let aliases = config.field_aliases()?;
    let rows = source.load().await?;
    let preview = preview_row(&rows, &aliases, index)?;

    println!("--- Row {} ---", index);
    if let Some(row) = rows.get(index) {
        for (column, value) in row.iter() {
            println!("{:<28} {}", column, value);
        }
    }
    println!();
    println!("--- Resolved fields ---");
    match (&preview.record, &preview.error) {
        (Some(record), _) => println!("{}", serde_json::to_string_pretty(record)?),
        (None, Some(error)) => println!("error: {}", error),
        (None, None) => {}
    }
    println!();
    println!("--- Paragraph ---");
    println!("{}", preview.paragraph);
    Ok(())
}
