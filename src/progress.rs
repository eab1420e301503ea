//! Conversion progress reporting.
//!
//! Reports observable progress during `charity-rag convert` so users see
//! which source is being read and how many rows have been rendered.
//! Progress is emitted on **stderr** so stdout stays usable for the
//! generated document.

use std::io::Write;

/// A single progress event for a conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvertProgressEvent {
    /// Rows are being read from a source. Total unknown.
    Loading { source: String },
    /// One batch finished rendering.
    Rendering {
        batch: usize,
        total_batches: usize,
        rows_done: usize,
        total_rows: usize,
    },
}

/// Receives progress events from the conversion pipeline.
pub trait ConvertProgressReporter: Send + Sync {
    fn report(&self, event: ConvertProgressEvent);
}

/// Human-friendly progress on stderr: "convert  batch 2 / 3  200 / 250 rows".
pub struct StderrProgress;

impl ConvertProgressReporter for StderrProgress {
    fn report(&self, event: ConvertProgressEvent) {
        let line = match &event {
            ConvertProgressEvent::Loading { source } => {
                format!("convert {}  loading...\n", source)
            }
            ConvertProgressEvent::Rendering {
                batch,
                total_batches,
                rows_done,
                total_rows,
            } => format!(
                "convert  batch {} / {}  {} / {} rows\n",
                batch,
                total_batches,
                format_number(*rows_done as u64),
                format_number(*total_rows as u64)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ConvertProgressReporter for JsonProgress {
    fn report(&self, event: ConvertProgressEvent) {
        let obj = match &event {
            ConvertProgressEvent::Loading { source } => serde_json::json!({
                "event": "progress",
                "phase": "loading",
                "source": source
            }),
            ConvertProgressEvent::Rendering {
                batch,
                total_batches,
                rows_done,
                total_rows,
            } => serde_json::json!({
                "event": "progress",
                "phase": "rendering",
                "batch": batch,
                "total_batches": total_batches,
                "n": rows_done,
                "total": total_rows
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ConvertProgressReporter for NoProgress {
    fn report(&self, _event: ConvertProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` value; `auto` defers to [`default_for_tty`](Self::default_for_tty).
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "auto" => Ok(Self::default_for_tty()),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            "off" => Ok(ProgressMode::Off),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Use auto, human, json, or off.",
                other
            ),
        }
    }

    pub fn reporter(&self) -> Box<dyn ConvertProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn parse_modes() {
        assert_eq!(ProgressMode::parse("json").unwrap(), ProgressMode::Json);
        assert_eq!(ProgressMode::parse("off").unwrap(), ProgressMode::Off);
        assert!(ProgressMode::parse("loud").is_err());
    }
}
