//! Writing generated documents to disk.
//!
//! Output files land in the configured output directory under a
//! timestamped name such as `charity_rag_20260301_142500.txt`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `<prefix>_<YYYYmmdd_HHMMSS>.<extension>`
pub fn generate_filename(prefix: &str, extension: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.{}", prefix, now.format("%Y%m%d_%H%M%S"), extension)
}

/// Write `text` to `dir/filename`, creating `dir` and adding a `.txt`
/// extension when missing. Returns the written path.
pub fn save_text_to_file(dir: &Path, filename: &str, text: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let filename = if filename.ends_with(".txt") {
        filename.to_string()
    } else {
        format!("{}.txt", filename)
    };
    let path = dir.join(filename);
    std::fs::write(&path, text)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    Ok(path)
}

/// Human-readable duration: `"350ms"`, `"2.50s"`, `"3m 5s"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.2}s", seconds)
    } else {
        let total = seconds.round() as u64;
        format!("{}m {}s", total / 60, total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_generate_filename() {
        let now = Local.with_ymd_and_hms(2026, 3, 1, 14, 25, 0).unwrap();
        assert_eq!(
            generate_filename("charity_rag", "txt", now),
            "charity_rag_20260301_142500.txt"
        );
    }

    #[test]
    fn test_save_adds_extension_and_creates_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("outputs");
        let path = save_text_to_file(&dir, "report", "hello").unwrap();
        assert_eq!(path, dir.join("report.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");

        let path = save_text_to_file(&dir, "kept.txt", "x").unwrap();
        assert_eq!(path, dir.join("kept.txt"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(350)), "350ms");
        assert_eq!(format_elapsed(Duration::from_millis(2500)), "2.50s");
        assert_eq!(format_elapsed(Duration::from_secs(185)), "3m 5s");
    }

    #[test]
    fn test_format_elapsed_carries_rounded_seconds_into_minutes() {
        assert_eq!(format_elapsed(Duration::from_millis(119_600)), "2m 0s");
        assert_eq!(format_elapsed(Duration::from_millis(60_400)), "1m 0s");
        assert_eq!(format_elapsed(Duration::from_millis(89_500)), "1m 30s");
    }
}
