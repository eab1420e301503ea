//! Metadata header: a short overview computed over the whole input.

use crate::models::{Field, RecordEntry};

pub const HEADER_TITLE: &str = "CHARITY DATABASE OVERVIEW";

/// Maximum number of distinct values listed per clause.
pub const MAX_LISTED: usize = 5;

/// Build the header for all `entries`. Faulty rows count towards the total
/// but contribute no values.
pub fn build_header(entries: &[RecordEntry]) -> String {
    let count = entries.len();
    let mut header = format!(
        "{}\n\nThis document contains information about {} charitable {}. ",
        HEADER_TITLE,
        count,
        if count == 1 {
            "organization"
        } else {
            "organizations"
        }
    );

    if let Some(list) = summarize(entries, Field::Sector) {
        header.push_str(&format!(
            "These organizations span sectors including: {}. ",
            list
        ));
    }
    if let Some(list) = summarize(entries, Field::Status) {
        header.push_str(&format!(
            "The database includes organization types such as: {}. ",
            list
        ));
    }
    if let Some(list) = summarize(entries, Field::Name) {
        header.push_str(&format!("Example organizations include: {}.", list));
    }

    header.trim_end().to_string()
}

/// First [`MAX_LISTED`] distinct non-empty values of `field`, in first-seen
/// order, with an "and others" suffix when more exist.
fn summarize(entries: &[RecordEntry], field: Field) -> Option<String> {
    let values = distinct_values(entries, field);
    if values.is_empty() {
        return None;
    }
    let listed = values[..values.len().min(MAX_LISTED)].join(", ");
    if values.len() > MAX_LISTED {
        Some(format!("{} and others", listed))
    } else {
        Some(listed)
    }
}

pub fn distinct_values(entries: &[RecordEntry], field: Field) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for record in entries.iter().filter_map(RecordEntry::record) {
        let value = record.get(field);
        if !value.is_empty() && !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CharityRecord;

    fn entry(name: &str, sector: &str, status: &str) -> RecordEntry {
        RecordEntry::Record(CharityRecord {
            name: name.to_string(),
            sector: sector.to_string(),
            status: status.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_full_header() {
        let entries = vec![
            entry("A", "Health", "Charity"),
            entry("B", "Arts", "Charity"),
            entry("C", "Health", "IPC"),
        ];
        assert_eq!(
            build_header(&entries),
            "CHARITY DATABASE OVERVIEW\n\n\
             This document contains information about 3 charitable organizations. \
             These organizations span sectors including: Health, Arts. \
             The database includes organization types such as: Charity, IPC. \
             Example organizations include: A, B, C."
        );
    }

    #[test]
    fn test_more_than_five_values_get_suffix() {
        let entries: Vec<RecordEntry> = (0..7)
            .map(|i| entry(&format!("Org {}", i), &format!("S{}", i), ""))
            .collect();
        let header = build_header(&entries);
        assert!(header.contains("including: S0, S1, S2, S3, S4 and others. "));
        assert!(header.contains("include: Org 0, Org 1, Org 2, Org 3, Org 4 and others."));
        assert!(!header.contains("organization types"));
    }

    #[test]
    fn test_clauses_omitted_without_values() {
        let entries = vec![entry("", "", "")];
        assert_eq!(
            build_header(&entries),
            "CHARITY DATABASE OVERVIEW\n\n\
             This document contains information about 1 charitable organization."
        );
    }

    #[test]
    fn test_faults_count_but_add_no_values() {
        let entries = vec![
            entry("A", "Health", ""),
            RecordEntry::Fault {
                position: 1,
                reason: "bad".to_string(),
            },
        ];
        let header = build_header(&entries);
        assert!(header.contains("about 2 charitable organizations"));
        assert!(header.contains("Example organizations include: A."));
    }
}
