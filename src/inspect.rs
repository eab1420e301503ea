//! Source inspection and single-row preview.
//!
//! `charity-rag inspect` shows what a source looks like before converting
//! it: which columns exist, how many values are missing, and which column
//! each logical field will be read from. Fields that resolve to no column
//! get a suggestion when a column differs from an alias only by case,
//! spacing, or underscores.
//!
//! `charity-rag preview` renders one row and shows the values resolved for
//! it, which is the quickest way to debug an alias table.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::fields::{cell_text, FieldAliases};
use crate::models::{CharityRecord, Field, RawRow};
use crate::paragraph::{fault_placeholder, render_paragraph};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub present: usize,
    pub missing: usize,
    pub sample: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldCoverage {
    pub field: &'static str,
    pub column: Option<String>,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InspectionReport {
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub fields: Vec<FieldCoverage>,
}

impl InspectionReport {
    pub fn missing_fields(&self) -> impl Iterator<Item = &FieldCoverage> {
        self.fields.iter().filter(|f| f.column.is_none())
    }
}

pub fn inspect_rows(rows: &[RawRow], aliases: &FieldAliases) -> InspectionReport {
    let mut columns: Vec<ColumnInfo> = Vec::new();
    for row in rows {
        for (name, value) in row.iter() {
            let idx = match columns.iter().position(|c| c.name == name) {
                Some(idx) => idx,
                None => {
                    columns.push(ColumnInfo {
                        name: name.to_string(),
                        present: 0,
                        missing: 0,
                        sample: None,
                    });
                    columns.len() - 1
                }
            };
            // Unusable values count as missing; preview shows the error.
            if let Ok(Some(text)) = cell_text(name, value) {
                let info = &mut columns[idx];
                info.present += 1;
                if info.sample.is_none() {
                    info.sample = Some(text);
                }
            }
        }
    }
    // Rows that lack a column entirely count as missing for it too.
    for info in &mut columns {
        info.missing = rows.len() - info.present;
    }

    let fields = Field::ALL
        .iter()
        .map(|&field| {
            let column = rows
                .iter()
                .find_map(|row| aliases.matching_column(row, field))
                .map(str::to_string);
            let suggestion = if column.is_none() {
                suggest_column(&columns, aliases.aliases(field))
            } else {
                None
            };
            FieldCoverage {
                field: field.key(),
                column,
                suggestion,
            }
        })
        .collect();

    InspectionReport {
        row_count: rows.len(),
        columns,
        fields,
    }
}

fn simplify(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn suggest_column(columns: &[ColumnInfo], aliases: &[String]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        let wanted = simplify(alias);
        columns
            .iter()
            .find(|c| simplify(&c.name) == wanted)
            .map(|c| c.name.clone())
    })
}

/// One row as the converter sees it.
#[derive(Debug, Clone, Serialize)]
pub struct RowPreview {
    pub index: usize,
    pub record: Option<CharityRecord>,
    pub error: Option<String>,
    pub paragraph: String,
}

/// Preview the row at 0-based `index`.
pub fn preview_row(rows: &[RawRow], aliases: &FieldAliases, index: usize) -> Result<RowPreview> {
    let Some(row) = rows.get(index) else {
        bail!(
            "row index {} out of range (source has {} rows)",
            index,
            rows.len()
        );
    };
    Ok(match aliases.normalize(row) {
        Ok(record) => RowPreview {
            index,
            paragraph: render_paragraph(&record),
            record: Some(record),
            error: None,
        },
        Err(e) => RowPreview {
            index,
            record: None,
            error: Some(e.to_string()),
            paragraph: fault_placeholder(index),
        },
    })
}

pub fn print_report(report: &InspectionReport) {
    println!("Rows: {}, Columns: {}", report.row_count, report.columns.len());
    println!();
    println!("{:<32} {:>8} {:>8}   SAMPLE", "COLUMN", "PRESENT", "MISSING");
    for c in &report.columns {
        println!(
            "{:<32} {:>8} {:>8}   {}",
            c.name,
            c.present,
            c.missing,
            c.sample.as_deref().map(truncate).unwrap_or_default()
        );
    }
    println!();
    println!("{:<22} COLUMN", "FIELD");
    for f in &report.fields {
        println!(
            "{:<22} {}",
            f.field,
            f.column.as_deref().unwrap_or("(not found)")
        );
    }

    let missing: Vec<&FieldCoverage> = report.missing_fields().collect();
    if missing.is_empty() {
        println!();
        println!("All fields found.");
        return;
    }
    println!();
    for f in missing {
        match &f.suggestion {
            Some(column) => println!(
                "Field '{}' not found; column '{}' might match. Add it under [fields].",
                f.field, column
            ),
            None => println!("Field '{}' not found; its clause will be omitted.", f.field),
        }
    }
}

fn truncate(text: &str) -> String {
    const MAX: usize = 40;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<RawRow> {
        vec![
            [
                ("Name of Organisation", json!("A")),
                ("SECTOR", json!("Health")),
                ("UEN", json!("")),
            ]
            .into_iter()
            .collect(),
            [("Name of Organisation", json!("B"))].into_iter().collect(),
        ]
    }

    #[test]
    fn test_column_counts() {
        let report = inspect_rows(&rows(), &FieldAliases::default());
        assert_eq!(report.row_count, 2);
        let name = &report.columns[0];
        assert_eq!((name.present, name.missing), (2, 0));
        assert_eq!(name.sample.as_deref(), Some("A"));
        let uen = report.columns.iter().find(|c| c.name == "UEN").unwrap();
        assert_eq!((uen.present, uen.missing), (0, 2));
        assert_eq!(uen.sample, None);
    }

    #[test]
    fn test_field_coverage_and_suggestions() {
        let report = inspect_rows(&rows(), &FieldAliases::default());
        let by_field = |key: &str| report.fields.iter().find(|f| f.field == key).unwrap();
        assert_eq!(by_field("name").column.as_deref(), Some("Name of Organisation"));
        assert_eq!(by_field("unique_entity_number").column.as_deref(), Some("UEN"));
        assert_eq!(by_field("sector").column, None);
        assert_eq!(by_field("sector").suggestion.as_deref(), Some("SECTOR"));
        assert_eq!(by_field("activities").suggestion, None);
        assert_eq!(report.missing_fields().count(), 5);
    }

    #[test]
    fn test_preview_row() {
        let preview = preview_row(&rows(), &FieldAliases::default(), 1).unwrap();
        assert_eq!(preview.record.unwrap().name, "B");
        assert_eq!(
            preview.paragraph,
            "B is a charitable organization with no ID specified."
        );
        assert!(preview_row(&rows(), &FieldAliases::default(), 2).is_err());
    }

    #[test]
    fn test_preview_row_with_fault() {
        let bad: Vec<RawRow> = vec![[("name", json!([1, 2]))].into_iter().collect()];
        let preview = preview_row(&bad, &FieldAliases::default(), 0).unwrap();
        assert!(preview.record.is_none());
        assert!(preview.error.unwrap().contains("name"));
        assert_eq!(preview.paragraph, "[Record 1: unable to render this entry]");
    }
}
