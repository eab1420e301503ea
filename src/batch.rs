//! Index-based batching of normalized rows.
//!
//! Rows are cut into consecutive slices of at most `batch_size` entries.
//! Each slice is rendered to paragraphs which are joined by a blank line.
//! Boundaries depend only on row positions, never on content, so rendering
//! batch by batch produces the same paragraphs as one big batch.

use anyhow::{bail, Result};

use crate::models::{Batch, RecordEntry};
use crate::paragraph::render_entry;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Separator between paragraphs, inside and across batches.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Output for an input with no rows.
pub const NO_RECORDS: &str = "No charity records available.";

/// Iterator over rendered batches.
pub struct Batches<'a> {
    entries: &'a [RecordEntry],
    batch_size: usize,
    next_start: usize,
    index: usize,
}

/// Start batching `entries`. Fails if `batch_size` is zero.
pub fn batches(entries: &[RecordEntry], batch_size: usize) -> Result<Batches<'_>> {
    validate_batch_size(batch_size)?;
    Ok(Batches {
        entries,
        batch_size,
        next_start: 0,
        index: 0,
    })
}

pub fn validate_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        bail!("batch_size must be > 0");
    }
    Ok(())
}

/// Number of batches `row_count` rows split into.
pub fn batch_count(row_count: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    row_count.div_ceil(batch_size)
}

impl<'a> Iterator for Batches<'a> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.next_start >= self.entries.len() {
            return None;
        }
        let start = self.next_start;
        let end = (start + self.batch_size).min(self.entries.len());

        let paragraphs: Vec<String> = self.entries[start..end]
            .iter()
            .map(render_entry)
            .filter(|p| !p.is_empty())
            .collect();

        let batch = Batch {
            index: self.index,
            start,
            end,
            paragraph_count: paragraphs.len(),
            text: paragraphs.join(PARAGRAPH_SEPARATOR),
        };

        self.next_start = end;
        self.index += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = batch_count(
            self.entries.len().saturating_sub(self.next_start),
            self.batch_size,
        );
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}

/// Render all batches to text. Empty input yields a single [`NO_RECORDS`].
pub fn batch_texts(entries: &[RecordEntry], batch_size: usize) -> Result<Vec<String>> {
    let texts: Vec<String> = batches(entries, batch_size)?.map(|b| b.text).collect();
    if texts.is_empty() {
        return Ok(vec![NO_RECORDS.to_string()]);
    }
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CharityRecord;

    fn entries(n: usize) -> Vec<RecordEntry> {
        (0..n)
            .map(|i| {
                RecordEntry::Record(CharityRecord {
                    name: format!("Org {}", i),
                    ..Default::default()
                })
            })
            .collect()
    }

    fn paragraphs_of(texts: &[String]) -> Vec<String> {
        texts
            .iter()
            .flat_map(|t| t.split(PARAGRAPH_SEPARATOR))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_250_rows_make_three_batches() {
        let rows = entries(250);
        let all: Vec<Batch> = batches(&rows, 100).unwrap().collect();
        let sizes: Vec<usize> = all.iter().map(Batch::row_count).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(all[2].start, 200);
        assert_eq!(all[2].end, 250);
        assert_eq!(all[1].index, 1);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        assert!(batches(&entries(3), 0).is_err());
        assert!(batch_texts(&entries(3), 0).is_err());
    }

    #[test]
    fn test_empty_input_yields_sentinel() {
        assert_eq!(batch_texts(&[], 10).unwrap(), vec![NO_RECORDS.to_string()]);
    }

    #[test]
    fn test_batching_preserves_paragraphs_and_order() {
        let rows = entries(23);
        let small = paragraphs_of(&batch_texts(&rows, 4).unwrap());
        let single = paragraphs_of(&batch_texts(&rows, rows.len()).unwrap());
        assert_eq!(small, single);
        assert_eq!(small.len(), 23);
        assert!(small[0].starts_with("Org 0 "));
        assert!(small[22].starts_with("Org 22 "));
    }

    #[test]
    fn test_fault_keeps_row_count() {
        let mut rows = entries(3);
        rows[1] = RecordEntry::Fault {
            position: 1,
            reason: "bad".to_string(),
        };
        let batch = batches(&rows, 10).unwrap().next().unwrap();
        assert_eq!(batch.paragraph_count, 3);
        assert!(batch.text.contains("[Record 2: unable to render this entry]"));
    }

    #[test]
    fn test_size_hint_counts_remaining() {
        let rows = entries(7);
        let mut it = batches(&rows, 3).unwrap();
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
        assert_eq!(batch_count(0, 3), 0);
        assert_eq!(batch_count(6, 3), 2);
    }
}
