//! Bar sources.
//!
//! The `BarSource` trait abstracts over where bars come from (a CSV
//! directory, synthetic generation, an in-memory map) so the analyzer can be
//! driven by real data in the CLI and by fixtures in tests.
//!
//! Synthetic data is a developer-only debug mode. Reports built on
//! synthetic data are tagged as such.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crosslevel_core::domain::Bar;

/// Structured error types for bar retrieval.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unparseable timestamp '{value}' at row {row}")]
    Timestamp { value: String, row: usize },

    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("no bars for '{instrument}' between {start} and {end}")]
    NoData {
        instrument: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    Csv,
    Memory,
    Synthetic,
}

/// Provider of chronologically ordered bars for one instrument.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn origin(&self) -> DataOrigin;

    /// Bars with timestamps in `[start, end]` (whole days, inclusive), ascending.
    fn fetch(&self, instrument: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, SourceError>;
}

fn in_range(bar: &Bar, start: NaiveDate, end: NaiveDate) -> bool {
    let day = bar.timestamp.date();
    day >= start && day <= end
}

fn require_some(bars: Vec<Bar>, instrument: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, SourceError> {
    if bars.is_empty() {
        return Err(SourceError::NoData {
            instrument: instrument.to_string(),
            start,
            end,
        });
    }
    Ok(bars)
}

// ─── CSV directory ──────────────────────────────────────────────────

/// One `<INSTRUMENT>.csv` per instrument with columns
/// `timestamp,open,high,low,close,volume`.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvBarSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, instrument: &str) -> PathBuf {
        self.dir.join(format!("{instrument}.csv"))
    }

    /// Read every bar in a CSV file, in file order.
    pub fn read_file(path: &Path) -> Result<Vec<Bar>, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| SourceError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        let mut bars = Vec::new();
        for (row, record) in reader.deserialize::<CsvRow>().enumerate() {
            let r = record.map_err(|source| SourceError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let timestamp = parse_timestamp(&r.timestamp).ok_or_else(|| SourceError::Timestamp {
                value: r.timestamp.clone(),
                row: row + 1,
            })?;
            bars.push(Bar {
                timestamp,
                open: r.open,
                high: r.high,
                low: r.low,
                close: r.close,
                volume: r.volume.max(0.0).round() as u64,
            });
        }
        Ok(bars)
    }
}

/// Accepts `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S` or a bare `%Y-%m-%d`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::Csv
    }

    fn fetch(&self, instrument: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, SourceError> {
        let path = self.path_for(instrument);
        if !path.exists() {
            return Err(SourceError::UnknownInstrument(instrument.to_string()));
        }
        let bars: Vec<Bar> = Self::read_file(&path)?
            .into_iter()
            .filter(|b| in_range(b, start, end))
            .collect();
        debug!(instrument, path = %path.display(), bars = bars.len(), "loaded CSV bars");
        require_some(bars, instrument, start, end)
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Seeded random walk from 100.0, weekdays only.
///
/// The seed is derived from the instrument name (and an optional salt), so
/// the same instrument always yields the same bars.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    salt: u64,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salt(salt: u64) -> Self {
        Self { salt }
    }

    pub fn generate(&self, instrument: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut hasher = blake3::Hasher::new();
        hasher.update(instrument.as_bytes());
        hasher.update(&self.salt.to_le_bytes());
        let seed: [u8; 32] = *hasher.finalize().as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = 100.0_f64;
        let mut current = start;

        while current <= end {
            let weekday = current.weekday();
            if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(Bar {
                timestamp: current.and_time(NaiveTime::MIN),
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl BarSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::Synthetic
    }

    fn fetch(&self, instrument: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, SourceError> {
        warn!(instrument, "generating synthetic bars; results are tagged as synthetic");
        require_some(self.generate(instrument, start, end), instrument, start, end)
    }
}

// ─── In-memory ──────────────────────────────────────────────────────

/// Bars held in memory, keyed by instrument.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bars: HashMap<String, Vec<Bar>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(instrument.into(), bars);
    }

    pub fn with(mut self, instrument: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(instrument, bars);
        self
    }
}

impl BarSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::Memory
    }

    fn fetch(&self, instrument: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, SourceError> {
        let bars = self
            .bars
            .get(instrument)
            .ok_or_else(|| SourceError::UnknownInstrument(instrument.to_string()))?;
        let selected = bars.iter().filter(|b| in_range(b, start, end)).cloned().collect();
        require_some(selected, instrument, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_supported_timestamp_formats() {
        let midnight = d(2024, 1, 2).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-02 00:00:00"), Some(midnight));
        assert_eq!(
            parse_timestamp("2024-01-02T15:30:00"),
            Some(d(2024, 1, 2).and_hms_opt(15, 30, 0).unwrap())
        );
        assert_eq!(parse_timestamp("01/02/2024"), None);
    }

    #[test]
    fn csv_source_filters_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("SPY.csv")).unwrap();
        writeln!(f, "timestamp,open,high,low,close,volume").unwrap();
        writeln!(f, "2024-01-02,100,102,99,101,1000").unwrap();
        writeln!(f, "2024-01-03,101,103,100,102,1100").unwrap();
        writeln!(f, "2024-01-04 00:00:00,102,104,101,103,0").unwrap();
        drop(f);

        let source = CsvBarSource::new(dir.path());
        let bars = source.fetch("SPY", d(2024, 1, 3), d(2024, 1, 31)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 102.0);
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn csv_source_unknown_instrument() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvBarSource::new(dir.path());
        let err = source.fetch("NOPE", d(2024, 1, 1), d(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, SourceError::UnknownInstrument(ref s) if s == "NOPE"));
    }

    #[test]
    fn csv_source_bad_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("X.csv"),
            "timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n",
        )
        .unwrap();
        let err = CsvBarSource::new(dir.path())
            .fetch("X", d(2024, 1, 1), d(2024, 2, 1))
            .unwrap_err();
        assert!(matches!(err, SourceError::Timestamp { row: 1, .. }));
    }

    #[test]
    fn synthetic_is_deterministic_and_skips_weekends() {
        let source = SyntheticSource::new();
        let a = source.generate("SPY", d(2024, 1, 1), d(2024, 1, 31));
        let b = source.generate("SPY", d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(a, b);
        assert_eq!(a.len(), 23);
        assert!(a.iter().all(|bar| bar.is_sane()));
        assert!(a
            .iter()
            .all(|bar| bar.timestamp.weekday().number_from_monday() <= 5));

        let other = SyntheticSource::with_salt(7).generate("SPY", d(2024, 1, 1), d(2024, 1, 31));
        assert_ne!(a, other);
    }

    #[test]
    fn memory_source_no_data_in_range() {
        let source = MemorySource::new().with("A", SyntheticSource::new().generate("A", d(2024, 1, 1), d(2024, 1, 10)));
        assert!(source.fetch("A", d(2024, 1, 1), d(2024, 1, 10)).is_ok());
        assert!(matches!(
            source.fetch("A", d(2025, 1, 1), d(2025, 1, 10)),
            Err(SourceError::NoData { .. })
        ));
        assert!(matches!(
            source.fetch("B", d(2024, 1, 1), d(2024, 1, 10)),
            Err(SourceError::UnknownInstrument(_))
        ));
    }
}
