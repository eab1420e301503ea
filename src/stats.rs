//! Database statistics.
//!
//! Provides a quick summary of what is in the database: how many charity
//! rows are available for conversion and how many documents have been
//! stored. Used by `charity-rag stats`.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::{self, quote_ident};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStats {
    pub charity_rows: Option<i64>,
    pub stored_contexts: Option<i64>,
    pub last_stored_at: Option<i64>,
}

async fn count_rows(pool: &SqlitePool, table: &str) -> Result<Option<i64>> {
    if !db::table_exists(pool, table).await? {
        return Ok(None);
    }
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
        .fetch_one(pool)
        .await?;
    Ok(Some(count))
}

pub async fn collect_stats(pool: &SqlitePool, config: &Config) -> Result<DbStats> {
    let charity_rows = count_rows(pool, &config.tables.charities).await?;
    let stored_contexts = count_rows(pool, &config.tables.rag_contexts).await?;
    let last_stored_at = if stored_contexts.is_some() {
        sqlx::query_scalar(&format!(
            "SELECT MAX(created_at) FROM {}",
            quote_ident(&config.tables.rag_contexts)
        ))
        .fetch_one(pool)
        .await?
    } else {
        None
    };

    Ok(DbStats {
        charity_rows,
        stored_contexts,
        last_stored_at,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect_stats(&pool, config).await?;
    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    let count_display = |count: Option<i64>| match count {
        Some(n) => n.to_string(),
        None => "(table missing)".to_string(),
    };

    println!("charity-rag database stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!(
        "  Charities:   {}  [{}]",
        count_display(stats.charity_rows),
        config.tables.charities
    );
    println!(
        "  Contexts:    {}  [{}]",
        count_display(stats.stored_contexts),
        config.tables.rag_contexts
    );
    println!(
        "  Last stored: {}",
        stats
            .last_stored_at
            .map(format_ts_relative)
            .unwrap_or_else(|| "never".to_string())
    );
    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp relative to now (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return crate::store::format_ts(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        crate::store::format_ts(ts)
    }
}
