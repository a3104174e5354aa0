//! CSV-backed history of every evaluated tick.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{Reader, Writer, WriterBuilder};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::Direction;

/// One parsed row from the signal log, reduced to the columns shared by
/// every strategy schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub timestamp: String,
    pub direction: Direction,
    pub confidence: f64,
}

/// Append-only CSV log. The header row is written once at creation and
/// verified on every reopen so rows from different strategy schemas never
/// mix in one file.
#[derive(Debug)]
pub struct SignalLog {
    path: PathBuf,
    header: &'static [&'static str],
}

impl SignalLog {
    /// Opens the log at `path`, creating it with `header` when missing.
    ///
    /// An existing file whose header does not match is rejected: move the
    /// file aside or point the config at a fresh path when switching
    /// strategies.
    pub fn open(path: impl Into<PathBuf>, header: &'static [&'static str]) -> Result<Self> {
        let path = path.into();

        if path.exists() {
            let mut reader = Reader::from_path(&path)?;
            let existing = reader.headers()?;
            if existing.len() != header.len() || existing.iter().zip(header).any(|(a, b)| a != *b) {
                return Err(AppError::Config(format!(
                    "Signal log {} has a different schema; move the file or change log_path",
                    path.display()
                )));
            }
            debug!(path = %path.display(), "Reopened signal log");
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut writer = Writer::from_path(&path)?;
            writer.write_record(header)?;
            writer.flush()?;
            debug!(path = %path.display(), "Created signal log");
        }

        Ok(Self { path, header })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row. The caller is responsible for matching the column
    /// order of the header this log was opened with.
    pub fn append(&self, row: &[String]) -> Result<()> {
        if row.len() != self.header.len() {
            return Err(AppError::SignalLog(format!(
                "Row has {} columns, log schema has {}",
                row.len(),
                self.header.len()
            )));
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }

    /// Returns the last `n` rows, oldest first.
    pub fn tail(&self, n: usize) -> Result<Vec<LogRow>> {
        let mut reader = Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let (Some(ts_idx), Some(signal_idx), Some(conf_idx)) = (
            position("timestamp"),
            position("signal"),
            position("confidence"),
        ) else {
            return Err(AppError::SignalLog(format!(
                "Signal log {} is missing timestamp/signal/confidence columns",
                self.path.display()
            )));
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(LogRow {
                timestamp: record.get(ts_idx).unwrap_or_default().to_string(),
                direction: record
                    .get(signal_idx)
                    .unwrap_or_default()
                    .parse()
                    .unwrap_or(Direction::None),
                confidence: record
                    .get(conf_idx)
                    .unwrap_or_default()
                    .parse()
                    .unwrap_or(0.0),
            });
        }

        let skip = rows.len().saturating_sub(n);
        Ok(rows.split_off(skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER: &[&str] = &["timestamp", "price", "signal", "confidence"];

    fn row(timestamp: &str, price: &str, signal: &str, confidence: &str) -> Vec<String> {
        vec![
            timestamp.to_string(),
            price.to_string(),
            signal.to_string(),
            confidence.to_string(),
        ]
    }

    #[test]
    fn test_open_creates_file_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let log = SignalLog::open(&path, HEADER).unwrap();
        assert_eq!(log.path(), path.as_path());

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("timestamp,price,signal,confidence"));
    }

    #[test]
    fn test_reopen_matching_header_succeeds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");

        SignalLog::open(&path, HEADER).unwrap();
        assert!(SignalLog::open(&path, HEADER).is_ok());
    }

    #[test]
    fn test_open_rejects_mismatched_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "time,close,verdict\n").unwrap();

        let err = SignalLog::open(&path, HEADER).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_append_and_tail_roundtrip() {
        let dir = tempdir().unwrap();
        let log = SignalLog::open(dir.path().join("log.csv"), HEADER).unwrap();

        log.append(&row("2024-03-01 10:00", "65000.00", "LONG", "0.75"))
            .unwrap();
        log.append(&row("2024-03-01 10:05", "65100.00", "NONE", "0.25"))
            .unwrap();

        let rows = log.tail(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, "2024-03-01 10:00");
        assert_eq!(rows[0].direction, Direction::Long);
        assert_eq!(rows[0].confidence, 0.75);
        assert_eq!(rows[1].direction, Direction::None);
    }

    #[test]
    fn test_tail_returns_most_recent_rows() {
        let dir = tempdir().unwrap();
        let log = SignalLog::open(dir.path().join("log.csv"), HEADER).unwrap();

        for i in 0..5 {
            log.append(&row(
                &format!("2024-03-01 10:{:02}", i * 5),
                "65000.00",
                "NONE",
                "0.0",
            ))
            .unwrap();
        }

        let rows = log.tail(2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, "2024-03-01 10:15");
        assert_eq!(rows[1].timestamp, "2024-03-01 10:20");
    }

    #[test]
    fn test_append_rejects_wrong_column_count() {
        let dir = tempdir().unwrap();
        let log = SignalLog::open(dir.path().join("log.csv"), HEADER).unwrap();

        let err = log.append(&["2024-03-01 10:00".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::SignalLog(_)));
    }

    #[test]
    fn test_tail_tolerates_unparseable_fields() {
        let dir = tempdir().unwrap();
        let log = SignalLog::open(dir.path().join("log.csv"), HEADER).unwrap();

        log.append(&row("2024-03-01 10:00", "65000.00", "sideways", "n/a"))
            .unwrap();

        let rows = log.tail(1).unwrap();
        assert_eq!(rows[0].direction, Direction::None);
        assert_eq!(rows[0].confidence, 0.0);
    }
}
