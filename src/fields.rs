//! Field alias table and value resolution.
//!
//! Source tables have carried the same logical field under several column
//! names over time (`Name of Organisation`, `name`, `organization_name`, ...).
//! [`FieldAliases`] maps every [`Field`] to an ordered list of accepted
//! column names; rows are normalized through it once, at ingestion, and the
//! renderer only ever sees [`CharityRecord`]s.
//!
//! A cell counts as absent when it is null, empty, whitespace-only, or one of
//! the null-like literals `null`, `nan`, `none` (any case).

use anyhow::{bail, Result};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::{CharityRecord, Field, RawRow, RecordEntry};

const NULL_LITERALS: [&str; 3] = ["null", "nan", "none"];

/// Ordered column aliases for each logical field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAliases {
    table: HashMap<Field, Vec<String>>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        let mut table = HashMap::new();
        for field in Field::ALL {
            let aliases = default_aliases(field)
                .iter()
                .map(|a| a.to_string())
                .collect();
            table.insert(field, aliases);
        }
        Self { table }
    }
}

fn default_aliases(field: Field) -> &'static [&'static str] {
    match field {
        Field::Name => &[
            "Name of Organisation",
            "name_of_organisation",
            "Name",
            "name",
            "organization_name",
            "organisation_name",
        ],
        Field::Status => &[
            "Type",
            "type",
            "organization_type",
            "organisation_type",
            "Status",
            "status",
        ],
        Field::UniqueEntityNumber => &["UEN", "uen", "unique_entity_number", "ID", "id"],
        Field::IpcPeriod => &["IPC Period", "ipc_period", "ipc"],
        Field::Sector => &["Sector", "sector"],
        Field::Classification => &["Classification", "classification"],
        Field::Activities => &["Activities", "activities", "Description", "description"],
    }
}

impl FieldAliases {
    /// Replace the alias list for one field.
    pub fn with_override(mut self, field: Field, aliases: Vec<String>) -> Result<Self> {
        if aliases.iter().all(|a| a.trim().is_empty()) {
            bail!("alias list for field '{}' must not be empty", field.key());
        }
        self.table.insert(field, aliases);
        Ok(self)
    }

    pub fn aliases(&self, field: Field) -> &[String] {
        self.table.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve one logical field from a raw row.
    ///
    /// Returns the first present value in alias order, or an empty string.
    /// Fails only when the selected cell holds an array or object.
    pub fn resolve(&self, row: &RawRow, field: Field) -> Result<String> {
        for alias in self.aliases(field) {
            let Some(value) = row.get(alias) else {
                continue;
            };
            if let Some(text) = cell_text(alias, value)? {
                return Ok(text);
            }
        }
        Ok(String::new())
    }

    /// First alias of `field` that names a column of `row`, present or not.
    pub fn matching_column<'a>(&'a self, row: &RawRow, field: Field) -> Option<&'a str> {
        self.aliases(field)
            .iter()
            .find(|alias| row.get(alias).is_some())
            .map(String::as_str)
    }

    /// Normalize a raw row into a [`CharityRecord`].
    pub fn normalize(&self, row: &RawRow) -> Result<CharityRecord> {
        let mut record = CharityRecord::default();
        for field in Field::ALL {
            record.set(field, self.resolve(row, field)?);
        }
        Ok(record)
    }
}

/// Normalize every row, keeping faults in place of rows that failed.
pub fn normalize_rows(aliases: &FieldAliases, rows: &[RawRow]) -> Vec<RecordEntry> {
    rows.iter()
        .enumerate()
        .map(|(position, row)| match aliases.normalize(row) {
            Ok(record) => RecordEntry::Record(record),
            Err(e) => {
                tracing::warn!(position, error = %e, "row could not be normalized");
                RecordEntry::Fault {
                    position,
                    reason: e.to_string(),
                }
            }
        })
        .collect()
}

/// True when a string carries no usable value.
pub fn is_absent(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || NULL_LITERALS
            .iter()
            .any(|literal| trimmed.eq_ignore_ascii_case(literal))
}

/// Display text of a cell, `None` when the cell is absent.
pub fn cell_text(column: &str, value: &Value) -> Result<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::Array(_) => bail!("column '{}' holds a list, expected text", column),
        Value::Object(_) => bail!("column '{}' holds an object, expected text", column),
    };
    if is_absent(&text) {
        Ok(None)
    } else {
        Ok(Some(text.trim().to_string()))
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        // CSV-to-frame round trips turn integer ids into floats like 2019.0
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> RawRow {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn test_exact_display_name_wins_over_lowercase() {
        let aliases = FieldAliases::default();
        let r = row(&[
            ("name", json!("lower")),
            ("Name of Organisation", json!("Display")),
        ]);
        assert_eq!(aliases.resolve(&r, Field::Name).unwrap(), "Display");
    }

    #[test]
    fn test_falls_through_absent_values() {
        let aliases = FieldAliases::default();
        let r = row(&[
            ("Activities", json!("  ")),
            ("activities", json!("null")),
            ("description", json!("Runs a food bank")),
        ]);
        assert_eq!(
            aliases.resolve(&r, Field::Activities).unwrap(),
            "Runs a food bank"
        );
    }

    #[test]
    fn test_missing_field_resolves_empty() {
        let aliases = FieldAliases::default();
        let r = row(&[("unrelated", json!("x"))]);
        assert_eq!(aliases.resolve(&r, Field::Sector).unwrap(), "");
    }

    #[test]
    fn test_null_literals_are_absent() {
        for text in ["", "   ", "null", "NULL", "NaN", "None", "\n"] {
            assert!(is_absent(text), "{:?} should be absent", text);
        }
        assert!(!is_absent("Nanyang Arts"));
    }

    #[test]
    fn test_numbers_and_bools_render() {
        let aliases = FieldAliases::default();
        let r = row(&[("UEN", json!(2019.0)), ("IPC Period", json!(3))]);
        let record = aliases.normalize(&r).unwrap();
        assert_eq!(record.unique_entity_number, "2019");
        assert_eq!(record.ipc_period, "3");
        assert_eq!(cell_text("c", &json!(true)).unwrap().as_deref(), Some("true"));
        assert_eq!(cell_text("c", &json!(1.5)).unwrap().as_deref(), Some("1.5"));
    }

    #[test]
    fn test_unexpected_type_is_an_error() {
        let aliases = FieldAliases::default();
        let r = row(&[("Sector", json!(["Health", "Social"]))]);
        let err = aliases.normalize(&r).unwrap_err();
        assert!(err.to_string().contains("Sector"));
    }

    #[test]
    fn test_unexpected_type_on_unused_column_is_ignored() {
        let aliases = FieldAliases::default();
        let r = row(&[("name", json!("Ok")), ("extra", json!({"a": 1}))]);
        assert_eq!(aliases.normalize(&r).unwrap().name, "Ok");
    }

    #[test]
    fn test_override_replaces_aliases() {
        let aliases = FieldAliases::default()
            .with_override(Field::Name, vec!["Org".to_string()])
            .unwrap();
        let r = row(&[("name", json!("ignored")), ("Org", json!("Chosen"))]);
        assert_eq!(aliases.resolve(&r, Field::Name).unwrap(), "Chosen");
        assert!(FieldAliases::default()
            .with_override(Field::Name, vec![])
            .is_err());
    }

    #[test]
    fn test_normalize_rows_keeps_positions() {
        let aliases = FieldAliases::default();
        let rows = vec![
            row(&[("name", json!("A"))]),
            row(&[("name", json!({"bad": true}))]),
            row(&[("name", json!("C"))]),
        ];
        let entries = normalize_rows(&aliases, &rows);
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[1], RecordEntry::Fault { position: 1, .. }));
        assert_eq!(entries[2].record().unwrap().name, "C");
    }

    #[test]
    fn test_matching_column_reports_first_alias_present() {
        let aliases = FieldAliases::default();
        let r = row(&[("type", json!(null)), ("status", json!("x"))]);
        assert_eq!(aliases.matching_column(&r, Field::Status), Some("type"));
        assert_eq!(aliases.matching_column(&r, Field::Sector), None);
    }
}
