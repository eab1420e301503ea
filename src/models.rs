//! Core data models used throughout charity-rag.
//!
//! These types represent the raw rows that data sources produce, the
//! canonical charity records the converter works on, and the batches that
//! make up a finished RAG document.

use serde::Serialize;
use serde_json::Value;

/// One source row: column name → cell value, in source column order.
///
/// Cells are JSON-like values so that CSV text, JSON documents, and SQLite
/// columns of any storage class share one shape. Arrays and objects are
/// accepted here and rejected at normalization time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, Value)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing any existing value for the same column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// Logical fields the converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Status,
    UniqueEntityNumber,
    IpcPeriod,
    Sector,
    Classification,
    Activities,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::Status,
        Field::UniqueEntityNumber,
        Field::IpcPeriod,
        Field::Sector,
        Field::Classification,
        Field::Activities,
    ];

    /// Canonical key, as used in configuration files and previews.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Status => "status",
            Field::UniqueEntityNumber => "unique_entity_number",
            Field::IpcPeriod => "ipc_period",
            Field::Sector => "sector",
            Field::Classification => "classification",
            Field::Activities => "activities",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }
}

/// A row normalized onto the logical fields. Absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CharityRecord {
    pub name: String,
    pub status: String,
    pub unique_entity_number: String,
    pub ipc_period: String,
    pub sector: String,
    pub classification: String,
    pub activities: String,
}

impl CharityRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Status => &self.status,
            Field::UniqueEntityNumber => &self.unique_entity_number,
            Field::IpcPeriod => &self.ipc_period,
            Field::Sector => &self.sector,
            Field::Classification => &self.classification,
            Field::Activities => &self.activities,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Status => &mut self.status,
            Field::UniqueEntityNumber => &mut self.unique_entity_number,
            Field::IpcPeriod => &mut self.ipc_period,
            Field::Sector => &mut self.sector,
            Field::Classification => &mut self.classification,
            Field::Activities => &mut self.activities,
        };
        *slot = value;
    }
}

/// Outcome of normalizing one source row.
///
/// A fault keeps its 0-based position so the rendered document still has
/// exactly one entry per input row.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEntry {
    Record(CharityRecord),
    Fault { position: usize, reason: String },
}

impl RecordEntry {
    pub fn record(&self) -> Option<&CharityRecord> {
        match self {
            RecordEntry::Record(record) => Some(record),
            RecordEntry::Fault { .. } => None,
        }
    }
}

/// A rendered slice `[start, end)` of the input rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub paragraph_count: usize,
    pub text: String,
}

impl Batch {
    pub fn row_count(&self) -> usize {
        self.end - self.start
    }
}
