//! CSV import into the charities table.
//!
//! Creates the table on first import with one TEXT column per CSV header,
//! adds columns that later files introduce, and inserts every row inside a
//! single transaction. Row order is kept through SQLite's `rowid`.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use std::path::Path;

use crate::config::Config;
use crate::db::{self, quote_ident};
use crate::fields::cell_text;
use crate::models::RawRow;
use crate::sources::{CsvSource, RowSource};

/// One table column and the source columns that feed it. SQLite column
/// names are case-insensitive, so `Name` and `name` land in one column.
struct TargetColumn {
    name: String,
    sources: Vec<String>,
}

fn target_columns(rows: &[RawRow]) -> Vec<TargetColumn> {
    let mut targets: Vec<TargetColumn> = Vec::new();
    for row in rows {
        for column in row.columns() {
            match targets
                .iter_mut()
                .find(|t| t.name.eq_ignore_ascii_case(column))
            {
                Some(target) => {
                    if !target.sources.iter().any(|s| s == column) {
                        target.sources.push(column.to_string());
                    }
                }
                None => targets.push(TargetColumn {
                    name: column.to_string(),
                    sources: vec![column.to_string()],
                }),
            }
        }
    }
    targets
}

/// Insert `rows` into `table`, creating or widening it as needed.
/// With `replace`, the table is dropped first. Returns the number of rows
/// written.
///
/// Source columns that differ only by case share a table column; the first
/// present value, in column order, is stored.
pub async fn import_rows(
    pool: &SqlitePool,
    table: &str,
    rows: &[RawRow],
    replace: bool,
) -> Result<u64> {
    let mut targets = target_columns(rows);
    if targets.is_empty() {
        bail!("nothing to import: no columns found");
    }

    let mut tx = pool.begin().await?;

    if replace {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
            .execute(&mut *tx)
            .await?;
    }

    let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *tx)
        .await?;

    if existing.is_empty() {
        let column_defs = targets
            .iter()
            .map(|t| format!("{} TEXT", quote_ident(&t.name)))
            .collect::<Vec<_>>()
            .join(", ");
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table),
            column_defs
        ))
        .execute(&mut *tx)
        .await?;
    } else {
        for target in &mut targets {
            match existing.iter().find(|e| e.eq_ignore_ascii_case(&target.name)) {
                Some(name) => target.name = name.clone(),
                None => {
                    sqlx::query(&format!(
                        "ALTER TABLE {} ADD COLUMN {} TEXT",
                        quote_ident(table),
                        quote_ident(&target.name)
                    ))
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
    }

    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        targets
            .iter()
            .map(|t| quote_ident(&t.name))
            .collect::<Vec<_>>()
            .join(", "),
        vec!["?"; targets.len()].join(", ")
    );

    let mut written = 0u64;
    for row in rows {
        let mut query = sqlx::query(&insert_sql);
        for target in &targets {
            query = query.bind(stored_text(row, &target.sources)?);
        }
        query.execute(&mut *tx).await?;
        written += 1;
    }

    tx.commit().await?;
    Ok(written)
}

/// Cell text as stored in SQLite; absent cells become NULL.
fn stored_text(row: &RawRow, sources: &[String]) -> Result<Option<String>> {
    for column in sources {
        if let Some(value) = row.get(column) {
            if let Some(text) = cell_text(column, value)? {
                return Ok(Some(text));
            }
        }
    }
    Ok(None)
}

/// CLI entry point for `charity-rag import`.
pub async fn run_import(config: &Config, path: &Path, replace: bool) -> Result<()> {
    let source = CsvSource::new(path);
    let rows = source.load().await?;
    if rows.is_empty() {
        println!("import {}", path.display());
        println!("  no rows found; nothing written");
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let table = &config.tables.charities;
    let written = import_rows(&pool, table, &rows, replace).await?;
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
        .fetch_one(&pool)
        .await?;
    pool.close().await;

    tracing::info!(table = %table, written, "import finished");
    println!("import {}", path.display());
    println!("  table: {}", table);
    println!("  rows written: {}", written);
    println!("  rows in table: {}", total);
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::parse_csv;

    #[test]
    fn test_target_columns_group_by_case() {
        let rows = parse_csv("Name,Sector,name\nA,Health,B\n".as_bytes()).unwrap();
        let targets = target_columns(&rows);
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Sector"]);
        assert_eq!(targets[0].sources, vec!["Name", "name"]);
    }

    #[test]
    fn test_stored_text_prefers_first_present_spelling() {
        let rows = parse_csv("Name,name\n,Second\nFirst,Other\n".as_bytes()).unwrap();
        let sources = vec!["Name".to_string(), "name".to_string()];
        assert_eq!(stored_text(&rows[0], &sources).unwrap().as_deref(), Some("Second"));
        assert_eq!(stored_text(&rows[1], &sources).unwrap().as_deref(), Some("First"));
    }
}
