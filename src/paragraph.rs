//! Paragraph rendering.
//!
//! Turns one [`CharityRecord`] into one natural-language paragraph using a
//! fixed template:
//!
//! ```text
//! <Name> is a <status> with the UEN identifier <id>. It <clauses>. The organization's activities include: <text>.
//! ```
//!
//! Every part after the opening sentence is optional and simply left out
//! when its field is empty.

use crate::models::{CharityRecord, RecordEntry};

pub const DEFAULT_STATUS: &str = "charitable organization";
pub const IDENTIFIER_LABEL: &str = "UEN identifier";

/// Render one record.
pub fn render_paragraph(record: &CharityRecord) -> String {
    let mut paragraph = opening_sentence(record);

    if let Some(sentence) = descriptive_sentence(record) {
        paragraph.push_str(&sentence);
    }

    let activities = collapse_whitespace(&record.activities);
    let activities = activities.trim_end_matches('.').trim_end();
    if !activities.is_empty() {
        paragraph.push_str(&format!(
            "The organization's activities include: {}.",
            activities
        ));
    }

    paragraph.trim().to_string()
}

/// Render a normalized entry, substituting a placeholder for faults.
pub fn render_entry(entry: &RecordEntry) -> String {
    match entry {
        RecordEntry::Record(record) => render_paragraph(record),
        RecordEntry::Fault { position, .. } => fault_placeholder(*position),
    }
}

/// Placeholder for a row that could not be rendered. `position` is 0-based.
pub fn fault_placeholder(position: usize) -> String {
    format!("[Record {}: unable to render this entry]", position + 1)
}

fn opening_sentence(record: &CharityRecord) -> String {
    let status = if record.status.is_empty() {
        DEFAULT_STATUS.to_string()
    } else {
        record.status.to_lowercase()
    };

    let mut sentence = if record.name.is_empty() {
        format!("An unnamed {} ", status)
    } else {
        format!("{} is a {} ", record.name, status)
    };

    if record.unique_entity_number.is_empty() {
        sentence.push_str("with no ID specified. ");
    } else {
        sentence.push_str(&format!(
            "with the {} {}. ",
            IDENTIFIER_LABEL, record.unique_entity_number
        ));
    }
    sentence
}

/// IPC period, sector and classification folded into one "It ..." sentence.
fn descriptive_sentence(record: &CharityRecord) -> Option<String> {
    let mut clauses = Vec::new();
    if !record.ipc_period.is_empty() {
        clauses.push(format!("has an IPC period of {}", record.ipc_period));
    }
    if !record.sector.is_empty() {
        clauses.push(format!("operates within the {} sector", record.sector));
    }
    if !record.classification.is_empty() {
        clauses.push(format!("is classified as {}", record.classification));
    }

    let joined = match clauses.as_slice() {
        [] => return None,
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    };
    Some(format!("It {}. ", joined))
}

/// Collapse every run of whitespace (including line breaks) to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> CharityRecord {
        CharityRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_record() {
        let record = CharityRecord {
            name: "Helping Hands".to_string(),
            status: "Registered Charity".to_string(),
            unique_entity_number: "T1234".to_string(),
            ipc_period: "2023-2026".to_string(),
            sector: "Health".to_string(),
            classification: "Hospitals".to_string(),
            activities: "Runs clinics\n and   outreach.".to_string(),
        };
        assert_eq!(
            render_paragraph(&record),
            "Helping Hands is a registered charity with the UEN identifier T1234. \
             It has an IPC period of 2023-2026, operates within the Health sector and \
             is classified as Hospitals. The organization's activities include: \
             Runs clinics and outreach."
        );
    }

    #[test]
    fn test_sector_only_clause() {
        let record = CharityRecord {
            name: "Helping Hands".to_string(),
            status: "registered charity".to_string(),
            unique_entity_number: "T1234".to_string(),
            sector: "Health".to_string(),
            ..Default::default()
        };
        let paragraph = render_paragraph(&record);
        assert!(paragraph.starts_with(
            "Helping Hands is a registered charity with the UEN identifier T1234. \
             It operates within the Health sector."
        ));
    }

    #[test]
    fn test_two_clauses_joined_with_and() {
        let record = CharityRecord {
            name: "A".to_string(),
            sector: "Arts".to_string(),
            classification: "Museums".to_string(),
            ..Default::default()
        };
        assert!(render_paragraph(&record)
            .ends_with("It operates within the Arts sector and is classified as Museums."));
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(
            render_paragraph(&CharityRecord::default()),
            "An unnamed charitable organization with no ID specified."
        );
    }

    #[test]
    fn test_name_only_is_opening_sentence() {
        assert_eq!(
            render_paragraph(&named("Lone Org")),
            "Lone Org is a charitable organization with no ID specified."
        );
    }

    #[test]
    fn test_unnamed_with_status() {
        let record = CharityRecord {
            status: "Exempt Charity".to_string(),
            unique_entity_number: "S99".to_string(),
            ..Default::default()
        };
        assert_eq!(
            render_paragraph(&record),
            "An unnamed exempt charity with the UEN identifier S99."
        );
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let record = named("Same");
        assert_eq!(render_paragraph(&record), render_paragraph(&record));
    }

    #[test]
    fn test_fault_placeholder_is_one_based() {
        let entry = RecordEntry::Fault {
            position: 4,
            reason: "bad".to_string(),
        };
        assert_eq!(
            render_entry(&entry),
            "[Record 5: unable to render this entry]"
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\t c  "), "a b c");
    }
}
