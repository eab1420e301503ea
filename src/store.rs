//! Stored RAG contexts.
//!
//! A finished document is written to the `rag_contexts` table together with
//! a JSON metadata payload. Storage is keyed by a SHA-256 of the content, so
//! storing the same document twice returns the existing row.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{self, quote_ident};

/// Metadata stored next to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub record_count: usize,
    pub fault_count: usize,
    pub batch_count: usize,
    pub batch_size: usize,
    pub include_metadata: bool,
    pub source: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredContext {
    pub id: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub content_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextSummary {
    pub id: String,
    pub created_at: i64,
    pub chars: i64,
    pub record_count: Option<u64>,
}

pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Store `content`; returns the row id and whether a new row was written.
pub async fn store_context(
    pool: &SqlitePool,
    table: &str,
    content: &str,
    metadata: &ContextMetadata,
) -> Result<(String, bool)> {
    let hash = content_hash(content);

    let existing: Option<String> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE content_hash = ?",
        quote_ident(table)
    ))
    .bind(&hash)
    .fetch_optional(pool)
    .await?;
    if let Some(id) = existing {
        return Ok((id, false));
    }

    let id = Uuid::new_v4().to_string();
    let metadata_json = serde_json::to_string(metadata)?;
    sqlx::query(&format!(
        "INSERT INTO {} (id, content, metadata_json, content_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        quote_ident(table)
    ))
    .bind(&id)
    .bind(content)
    .bind(&metadata_json)
    .bind(&hash)
    .bind(metadata.generated_at.timestamp())
    .execute(pool)
    .await?;

    tracing::info!(id = %id, chars = content.len(), "stored rag context");
    Ok((id, true))
}

/// Most recent contexts first.
pub async fn list_contexts(
    pool: &SqlitePool,
    table: &str,
    limit: i64,
) -> Result<Vec<ContextSummary>> {
    let rows = sqlx::query(&format!(
        "SELECT id, created_at, LENGTH(content) AS chars, metadata_json FROM {} \
         ORDER BY created_at DESC, rowid DESC LIMIT ?",
        quote_ident(table)
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let metadata_json: String = row.get("metadata_json");
            let record_count = serde_json::from_str::<serde_json::Value>(&metadata_json)
                .ok()
                .and_then(|m| m.get("record_count").and_then(|v| v.as_u64()));
            ContextSummary {
                id: row.get("id"),
                created_at: row.get("created_at"),
                chars: row.get("chars"),
                record_count,
            }
        })
        .collect())
}

pub async fn get_context(pool: &SqlitePool, table: &str, id: &str) -> Result<Option<StoredContext>> {
    let row = sqlx::query(&format!(
        "SELECT id, content, metadata_json, content_hash, created_at FROM {} WHERE id = ?",
        quote_ident(table)
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        let metadata_json: String = row.get("metadata_json");
        StoredContext {
            id: row.get("id"),
            content: row.get("content"),
            metadata: serde_json::from_str(&metadata_json).unwrap_or(serde_json::json!({})),
            content_hash: row.get("content_hash"),
            created_at: row.get("created_at"),
        }
    }))
}

/// Returns true if a row was deleted.
pub async fn delete_context(pool: &SqlitePool, table: &str, id: &str) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", quote_ident(table)))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn connect_checked(config: &Config) -> Result<SqlitePool> {
    let pool = db::connect(config).await?;
    if !db::table_exists(&pool, &config.tables.rag_contexts).await? {
        pool.close().await;
        bail!(
            "table '{}' does not exist. Run `charity-rag init` first.",
            config.tables.rag_contexts
        );
    }
    Ok(pool)
}

/// CLI entry point for `charity-rag contexts list`.
pub async fn run_list(config: &Config, limit: i64) -> Result<()> {
    let pool = connect_checked(config).await?;
    let contexts = list_contexts(&pool, &config.tables.rag_contexts, limit).await?;
    pool.close().await;

    if contexts.is_empty() {
        println!("No stored contexts.");
        return Ok(());
    }

    println!("{:<38} {:<17} {:>8} {:>10}", "ID", "CREATED", "RECORDS", "CHARS");
    for c in &contexts {
        println!(
            "{:<38} {:<17} {:>8} {:>10}",
            c.id,
            format_ts(c.created_at),
            c.record_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            c.chars
        );
    }
    Ok(())
}

/// CLI entry point for `charity-rag contexts get`.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let pool = connect_checked(config).await?;
    let context = get_context(&pool, &config.tables.rag_contexts, id).await?;
    pool.close().await;

    let context = context.with_context(|| format!("context not found: {}", id))?;
    println!("--- Context ---");
    println!("id:           {}", context.id);
    println!("created_at:   {}", format_ts(context.created_at));
    println!("content_hash: {}", context.content_hash);
    println!("metadata:     {}", context.metadata);
    println!();
    println!("--- Content ---");
    println!("{}", context.content);
    Ok(())
}

/// CLI entry point for `charity-rag contexts delete`.
pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let pool = connect_checked(config).await?;
    let deleted = delete_context(&pool, &config.tables.rag_contexts, id).await?;
    pool.close().await;

    if !deleted {
        bail!("context not found: {}", id);
    }
    println!("Deleted context {}", id);
    Ok(())
}

pub fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
