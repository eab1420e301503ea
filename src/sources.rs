//! Row sources.
//!
//! A [`RowSource`] produces the ordered rows a conversion runs on. Three
//! sources ship with the crate:
//!
//! | Source | Reads |
//! |--------|-------|
//! | [`CsvSource`] | a CSV file whose first line names the columns |
//! | [`JsonSource`] | a JSON file holding an array of objects |
//! | [`TableSource`] | the configured SQLite charities table |
//!
//! Sources only move data; they never interpret column names. That is the
//! job of [`crate::fields::FieldAliases`].

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db::{self, decode_row, quote_ident};
use crate::fields::cell_text;
use crate::models::RawRow;

/// A producer of ordered source rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Short description used in progress output and stored metadata.
    fn describe(&self) -> String;

    /// Load all rows, in source order.
    async fn load(&self) -> Result<Vec<RawRow>>;
}

// ─── CSV ────────────────────────────────────────────────────────────

pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RowSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    async fn load(&self) -> Result<Vec<RawRow>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;
        parse_csv(file).with_context(|| format!("Failed to parse CSV: {}", self.path.display()))
    }
}

/// Parse CSV text into rows. Every cell is kept as a string; empty cells
/// stay empty and are treated as absent later on.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        bail!("CSV header is empty");
    }
    for (i, header) in headers.iter().enumerate() {
        if headers.iter().take(i).any(|earlier| earlier == header) {
            bail!("duplicate CSV column '{}' (column {})", header, i + 1);
        }
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cell = record.get(i).unwrap_or("");
                (header.to_string(), Value::String(cell.to_string()))
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

// ─── JSON ───────────────────────────────────────────────────────────

pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RowSource for JsonSource {
    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }

    async fn load(&self) -> Result<Vec<RawRow>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read JSON file: {}", self.path.display()))?;
        parse_json(&content)
            .with_context(|| format!("Failed to parse JSON: {}", self.path.display()))
    }
}

/// Parse a JSON array of objects into rows.
pub fn parse_json(content: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        bail!("expected a JSON array of objects");
    };

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => rows.push(map.into_iter().collect::<RawRow>()),
            other => bail!(
                "element {} is {}, expected an object",
                i,
                json_kind(&other)
            ),
        }
    }
    Ok(rows)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─── SQLite table ───────────────────────────────────────────────────

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

impl ColumnFilter {
    /// Parse `COLUMN=VALUE`.
    pub fn parse(s: &str) -> Result<Self> {
        let Some((column, value)) = s.split_once('=') else {
            bail!("invalid filter '{}': expected COLUMN=VALUE", s);
        };
        if column.trim().is_empty() {
            bail!("invalid filter '{}': column name is empty", s);
        }
        Ok(Self {
            column: column.trim().to_string(),
            value: value.to_string(),
        })
    }
}

impl ColumnFilter {
    /// True when the row's cell in the filter column reads as the value.
    pub fn matches(&self, row: &RawRow) -> bool {
        row.get(&self.column)
            .map(|value| matches!(cell_text(&self.column, value), Ok(Some(text)) if text == self.value))
            .unwrap_or(false)
    }
}

fn push_selection(desc: &mut String, filter: Option<&ColumnFilter>, limit: Option<usize>) {
    if let Some(f) = filter {
        desc.push_str(&format!(" where {}={}", f.column, f.value));
    }
    if let Some(limit) = limit {
        desc.push_str(&format!(" limit {}", limit));
    }
}

/// Apply a column filter, then a row limit, to rows already in memory.
///
/// Fails when the filter names a column no row carries.
pub fn select_rows(
    rows: Vec<RawRow>,
    limit: Option<usize>,
    filter: Option<&ColumnFilter>,
) -> Result<Vec<RawRow>> {
    let mut rows = rows;
    if let Some(f) = filter {
        if !rows.is_empty() && !rows.iter().any(|r| r.get(&f.column).is_some()) {
            let available: Vec<&str> = rows[0].columns().collect();
            bail!(
                "unknown filter column '{}'. Available: {}",
                f.column,
                available.join(", ")
            );
        }
        rows.retain(|row| f.matches(row));
    }
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

/// A file source narrowed by `--filter` and `--limit` after loading.
pub struct SelectedSource {
    inner: Box<dyn RowSource>,
    limit: Option<usize>,
    filter: Option<ColumnFilter>,
}

impl SelectedSource {
    pub fn new(
        inner: Box<dyn RowSource>,
        limit: Option<usize>,
        filter: Option<ColumnFilter>,
    ) -> Self {
        Self {
            inner,
            limit,
            filter,
        }
    }
}

#[async_trait]
impl RowSource for SelectedSource {
    fn describe(&self) -> String {
        let mut desc = self.inner.describe();
        push_selection(&mut desc, self.filter.as_ref(), self.limit);
        desc
    }

    async fn load(&self) -> Result<Vec<RawRow>> {
        let rows = self.inner.load().await?;
        select_rows(rows, self.limit, self.filter.as_ref())
    }
}

/// Rows of the configured charities table, in insertion order.
pub struct TableSource {
    config: Config,
    limit: Option<usize>,
    filter: Option<ColumnFilter>,
}

impl TableSource {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            limit: None,
            filter: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_filter(mut self, filter: Option<ColumnFilter>) -> Self {
        self.filter = filter;
        self
    }
}

#[async_trait]
impl RowSource for TableSource {
    fn describe(&self) -> String {
        let mut desc = format!("table:{}", self.config.tables.charities);
        push_selection(&mut desc, self.filter.as_ref(), self.limit);
        desc
    }

    async fn load(&self) -> Result<Vec<RawRow>> {
        let pool = db::connect(&self.config).await?;
        let result = fetch_rows(
            &pool,
            &self.config.tables.charities,
            self.limit,
            self.filter.as_ref(),
        )
        .await;
        pool.close().await;
        result
    }
}

/// Fetch rows from `table`, optionally filtered on one column and limited.
pub async fn fetch_rows(
    pool: &sqlx::SqlitePool,
    table: &str,
    limit: Option<usize>,
    filter: Option<&ColumnFilter>,
) -> Result<Vec<RawRow>> {
    if !db::table_exists(pool, table).await? {
        bail!(
            "table '{}' does not exist. Import data first: charity-rag import <file.csv>",
            table
        );
    }

    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    if let Some(f) = filter {
        let columns = db::table_columns(pool, table).await?;
        if !columns.iter().any(|c| *c == f.column) {
            bail!(
                "unknown filter column '{}'. Available: {}",
                f.column,
                columns.join(", ")
            );
        }
        sql.push_str(&format!(" WHERE {} = ?", quote_ident(&f.column)));
    }
    sql.push_str(" ORDER BY rowid");
    if limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut query = sqlx::query(&sql);
    if let Some(f) = filter {
        query = query.bind(f.value.clone());
    }
    if let Some(lim) = limit {
        query = query.bind(lim as i64);
    }

    let rows = query.fetch_all(pool).await?;
    tracing::debug!(table, rows = rows.len(), "fetched rows");
    rows.iter().map(decode_row).collect()
}

/// Pick the source for a conversion: a file if one was given, the
/// configured table otherwise. Limit and filter apply to either.
pub fn select_source(
    config: &Config,
    csv: Option<&Path>,
    json: Option<&Path>,
    limit: Option<usize>,
    filter: Option<ColumnFilter>,
) -> Result<Box<dyn RowSource>> {
    let file: Box<dyn RowSource> = match (csv, json) {
        (Some(_), Some(_)) => bail!("--csv and --json cannot be used together"),
        (Some(path), None) => Box::new(CsvSource::new(path)),
        (None, Some(path)) => Box::new(JsonSource::new(path)),
        (None, None) => {
            return Ok(Box::new(
                TableSource::new(config)
                    .with_limit(limit)
                    .with_filter(filter),
            ))
        }
    };
    if limit.is_none() && filter.is_none() {
        return Ok(file);
    }
    Ok(Box::new(SelectedSource::new(file, limit, filter)))
}
