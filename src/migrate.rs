use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::{self, quote_ident};

/// Create the stored-context table and its indexes. Idempotent.
///
/// The charities table is not created here: its columns follow whatever
/// CSV is imported into it (see [`crate::import`]).
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = ensure_contexts_table(&pool, &config.tables.rag_contexts).await;
    pool.close().await;
    result?;

    tracing::info!(table = %config.tables.rag_contexts, "migrations applied");
    Ok(())
}

pub async fn ensure_contexts_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            metadata_json TEXT NOT NULL DEFAULT '{{}}',
            content_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        )
        "#,
        quote_ident(table)
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS {} ON {}(created_at DESC)",
        quote_ident(&format!("idx_{}_created_at", table)),
        quote_ident(table)
    ))
    .execute(pool)
    .await?;

    Ok(())
}
