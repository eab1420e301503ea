//! Top-level assembly of a RAG document.
//!
//! [`format_for_rag`] is the whole pipeline in one call:
//!
//! ```text
//! rows ──▶ normalize (alias table) ──▶ header (all rows)  ──┐
//!                                  └─▶ batches (N rows each) ──▶ document
//! ```
//!
//! The pipeline is a pure function of its inputs. The only caller-visible
//! failure is a zero batch size; row faults become placeholder paragraphs.

use anyhow::Result;

use crate::batch::{
    batch_count, batches, validate_batch_size, DEFAULT_BATCH_SIZE, NO_RECORDS, PARAGRAPH_SEPARATOR,
};
use crate::fields::{normalize_rows, FieldAliases};
use crate::header::build_header;
use crate::models::{Batch, RawRow};
use crate::progress::{ConvertProgressEvent, ConvertProgressReporter, NoProgress};

/// Output when neither header nor batches produced any text.
pub const NO_CONTENT: &str = "No content generated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub include_metadata: bool,
    pub batch_size: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A converted document, kept in parts so callers can report on it.
#[derive(Debug, Clone, PartialEq)]
pub struct RagDocument {
    pub record_count: usize,
    pub fault_count: usize,
    pub header: Option<String>,
    pub batches: Vec<Batch>,
}

impl RagDocument {
    /// Join header and batch texts into the final document string.
    pub fn render(&self) -> String {
        if self.record_count == 0 {
            return NO_RECORDS.to_string();
        }

        let header = self.header.as_deref().unwrap_or("").trim();
        let body = self
            .batches
            .iter()
            .map(|b| b.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR);

        match (header.is_empty(), body.is_empty()) {
            (false, false) => format!("{}{}{}", header, PARAGRAPH_SEPARATOR, body),
            (false, true) => header.to_string(),
            (true, false) => body,
            (true, true) => NO_CONTENT.to_string(),
        }
    }

    pub fn paragraph_count(&self) -> usize {
        self.batches.iter().map(|b| b.paragraph_count).sum()
    }
}

/// Convert rows with the default alias table.
pub fn format_for_rag(rows: &[RawRow], options: FormatOptions) -> Result<String> {
    let document = build_document(rows, &FieldAliases::default(), options, &NoProgress)?;
    Ok(document.render())
}

/// Convert rows into a [`RagDocument`], reporting one event per batch.
pub fn build_document(
    rows: &[RawRow],
    aliases: &FieldAliases,
    options: FormatOptions,
    progress: &dyn ConvertProgressReporter,
) -> Result<RagDocument> {
    validate_batch_size(options.batch_size)?;

    let entries = normalize_rows(aliases, rows);
    let fault_count = entries.iter().filter(|e| e.record().is_none()).count();

    let header = if options.include_metadata && !entries.is_empty() {
        Some(build_header(&entries))
    } else {
        None
    };

    let total_batches = batch_count(entries.len(), options.batch_size);
    let mut rendered = Vec::with_capacity(total_batches);
    for batch in batches(&entries, options.batch_size)? {
        progress.report(ConvertProgressEvent::Rendering {
            batch: batch.index + 1,
            total_batches,
            rows_done: batch.end,
            total_rows: entries.len(),
        });
        rendered.push(batch);
    }

    tracing::debug!(
        rows = entries.len(),
        faults = fault_count,
        batches = rendered.len(),
        "document assembled"
    );

    Ok(RagDocument {
        record_count: entries.len(),
        fault_count,
        header,
        batches: rendered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn charity(name: &str, sector: &str) -> RawRow {
        [
            ("Name of Organisation", json!(name)),
            ("Sector", json!(sector)),
        ]
        .into_iter()
        .collect()
    }

    struct Recorder(Mutex<Vec<ConvertProgressEvent>>);

    impl ConvertProgressReporter for Recorder {
        fn report(&self, event: ConvertProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_empty_input_returns_sentinel() {
        let text = format_for_rag(&[], FormatOptions::default()).unwrap();
        assert_eq!(text, NO_RECORDS);
        let text = format_for_rag(
            &[],
            FormatOptions {
                include_metadata: false,
                batch_size: 5,
            },
        )
        .unwrap();
        assert_eq!(text, NO_RECORDS);
    }

    #[test]
    fn test_header_then_paragraphs() {
        let rows = vec![charity("A", "Health"), charity("B", "Arts")];
        let text = format_for_rag(&rows, FormatOptions::default()).unwrap();
        let parts: Vec<&str> = text.split(PARAGRAPH_SEPARATOR).collect();
        assert_eq!(parts[0], "CHARITY DATABASE OVERVIEW");
        assert!(parts[1].starts_with("This document contains information about 2"));
        assert!(parts[2].starts_with("A is a charitable organization"));
        assert!(parts[3].starts_with("B is a charitable organization"));
        assert_eq!(parts.len(), 4);
    }

    #[test]
    fn test_without_metadata() {
        let rows = vec![charity("A", "Health")];
        let text = format_for_rag(
            &rows,
            FormatOptions {
                include_metadata: false,
                batch_size: 10,
            },
        )
        .unwrap();
        assert_eq!(
            text,
            "A is a charitable organization with no ID specified. \
             It operates within the Health sector."
        );
    }

    #[test]
    fn test_zero_batch_size_fails() {
        let rows = vec![charity("A", "Health")];
        let options = FormatOptions {
            include_metadata: true,
            batch_size: 0,
        };
        assert!(format_for_rag(&rows, options).is_err());
        assert!(format_for_rag(&[], options).is_err());
    }

    #[test]
    fn test_250_rows_single_header_three_batches() {
        let rows: Vec<RawRow> = (0..250)
            .map(|i| charity(&format!("Org {}", i), "Health"))
            .collect();
        let recorder = Recorder(Mutex::new(Vec::new()));
        let doc = build_document(
            &rows,
            &FieldAliases::default(),
            FormatOptions::default(),
            &recorder,
        )
        .unwrap();

        assert_eq!(doc.batches.len(), 3);
        assert_eq!(doc.paragraph_count(), 250);
        assert!(doc
            .header
            .as_deref()
            .unwrap()
            .contains("about 250 charitable organizations"));

        let text = doc.render();
        assert_eq!(text.matches(crate::header::HEADER_TITLE).count(), 1);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2],
            ConvertProgressEvent::Rendering {
                batch: 3,
                total_batches: 3,
                rows_done: 250,
                total_rows: 250,
            }
        );
    }

    #[test]
    fn test_fault_row_keeps_count_and_order() {
        let mut bad = RawRow::new();
        bad.insert("Name of Organisation", json!(["not", "text"]));
        let rows = vec![charity("A", "Health"), bad, charity("C", "Arts")];
        let doc = build_document(
            &rows,
            &FieldAliases::default(),
            FormatOptions {
                include_metadata: false,
                batch_size: 2,
            },
            &NoProgress,
        )
        .unwrap();
        assert_eq!(doc.fault_count, 1);
        let paragraphs: Vec<String> = doc
            .render()
            .split(PARAGRAPH_SEPARATOR)
            .map(str::to_string)
            .collect();
        assert_eq!(paragraphs.len(), 3);
        assert!(paragraphs[0].starts_with("A "));
        assert_eq!(paragraphs[1], "[Record 2: unable to render this entry]");
        assert!(paragraphs[2].starts_with("C "));
    }

    #[test]
    fn test_header_only_and_no_content_fallbacks() {
        let doc = RagDocument {
            record_count: 1,
            fault_count: 0,
            header: Some("HEAD".to_string()),
            batches: Vec::new(),
        };
        assert_eq!(doc.render(), "HEAD");
        let doc = RagDocument {
            header: None,
            ..doc
        };
        assert_eq!(doc.render(), NO_CONTENT);
    }

    #[test]
    fn test_lowercase_keys_resolve_end_to_end() {
        let row: RawRow = [
            ("name", json!("Helping Hands")),
            ("status", json!("registered charity")),
            ("id", json!("T1234")),
            ("sector", json!("Health")),
        ]
        .into_iter()
        .collect();
        let options = FormatOptions {
            include_metadata: false,
            batch_size: 100,
        };
        assert_eq!(
            format_for_rag(&[row.clone()], options).unwrap(),
            "Helping Hands is a registered charity with the UEN identifier T1234. \
             It operates within the Health sector."
        );

        let with_header = format_for_rag(&[row], FormatOptions::default()).unwrap();
        assert!(with_header.contains("about 1 charitable organization"));
        assert!(with_header.contains("sectors including: Health."));
        assert!(with_header.ends_with("It operates within the Health sector."));
    }
}
