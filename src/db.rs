use anyhow::{bail, Result};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::str::FromStr;

use crate::config::Config;
use crate::models::RawRow;

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name = ?",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Column names of `table`, in declaration order.
pub async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(pool)
            .await?;
    Ok(names)
}

/// Read every column of an SQLite row into a [`RawRow`], whatever its
/// storage class.
pub fn decode_row(row: &SqliteRow) -> Result<RawRow> {
    let mut raw = RawRow::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value_ref = row.try_get_raw(i)?;
        let value = if value_ref.is_null() {
            Value::Null
        } else {
            let type_name = value_ref.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(i)?),
                "REAL" => Value::from(row.try_get::<f64, _>(i)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(i)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                "TEXT" => Value::String(row.try_get::<String, _>(i)?),
                other => bail!(
                    "column '{}' has unsupported SQLite type {}",
                    column.name(),
                    other
                ),
            }
        };
        raw.insert(column.name(), value);
    }
    Ok(raw)
}
