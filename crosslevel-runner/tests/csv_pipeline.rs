//! Integration tests for the runner's CSV pipeline.
//!
//! These tests write a bar file and a TOML config to a temp directory, then
//! drive the analyzer end to end the way the CLI does.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use crosslevel_core::signals::{CrossoverSetup, Signal};
use crosslevel_runner::{
    AnalysisConfig, AnalysisError, Analyzer, CsvBarSource, DataOrigin, MemoryCache, SourceError,
};

/// Gently rising closes with a sine wobble, one row per calendar day.
fn write_bars(dir: &Path, instrument: &str, days: usize) {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut text = String::from("timestamp,open,high,low,close,volume\n");
    for i in 0..days {
        let date = start + chrono::Duration::days(i as i64);
        let close = 50.0 + i as f64 * 0.2 + (i as f64 / 7.0).sin() * 4.0;
        // Every tenth bar is a market holiday with zero volume.
        let volume = if i % 10 == 9 { 0 } else { 25_000 + i * 3 };
        text.push_str(&format!(
            "{date},{:.4},{:.4},{:.4},{close:.4},{volume}\n",
            close - 0.1,
            close + 0.8,
            close - 0.8,
        ));
    }
    std::fs::write(dir.join(format!("{instrument}.csv")), text).unwrap();
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("analysis.toml");
    std::fs::write(&path, body).unwrap();
    path
}

const CONFIG: &str = r#"
[analysis]
instrument = "WAVE"
start_date = "2023-01-02"
end_date = "2024-06-30"

[crossovers]
periods = [9, 21]
lookback = 8

[pivots]
back = 5
forward = 5
window = 200
"#;

#[test]
fn csv_to_report() {
    let dir = tempfile::tempdir().unwrap();
    write_bars(dir.path(), "WAVE", 500);
    let config = AnalysisConfig::from_file(&write_config(dir.path(), CONFIG)).unwrap();

    let analyzer = Analyzer::new(
        Arc::new(CsvBarSource::new(dir.path())),
        Arc::new(MemoryCache::new()),
    );
    let report = analyzer.analyze(&config).unwrap();

    assert_eq!(report.origin, DataOrigin::Csv);
    assert_eq!(report.bar_count, 500);
    assert_eq!(report.signals.crossover_setup, CrossoverSetup::Pair(9, 21));
    assert_eq!(report.signals.recent_crossovers.len(), 8);
    // Rising drift keeps SMA50 above SMA200 at the end.
    let composite = report.signals.composite.unwrap();
    assert_eq!(composite.golden, 1);
    assert_eq!(composite.death, 0);
    // Holidays are dropped before the pivot window is cut.
    assert_eq!(report.pivots.window_bars, 199);
    assert!(report.pivots.limit > 0.0);
    assert!(!report.pivots.limit_fallback);
    for level in &report.pivots.levels {
        assert!(level.timestamp.date() <= NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }
}

#[test]
fn semaphore_readings_follow_config_order() {
    let dir = tempfile::tempdir().unwrap();
    write_bars(dir.path(), "WAVE", 300);
    let toml = format!(
        "{CONFIG}\n[[semaphores]]\nname = \"slow\"\nshort_span = 50\nlong_span = 200\n\n\
         [[semaphores]]\nname = \"fast\"\nshort_span = 4\nlong_span = 9\n"
    );
    let config = AnalysisConfig::from_toml(&toml).unwrap();

    let analyzer = Analyzer::uncached(Arc::new(CsvBarSource::new(dir.path())));
    let signals = analyzer.signals(&config).unwrap();
    let names: Vec<&str> = signals.semaphores.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["slow", "fast"]);
    for reading in &signals.semaphores {
        assert!(matches!(
            reading.signal,
            Signal::Bullish | Signal::Bearish | Signal::Neutral
        ));
    }
}

#[test]
fn feature_csv_has_one_row_per_bar() {
    let dir = tempfile::tempdir().unwrap();
    write_bars(dir.path(), "WAVE", 260);
    let config = AnalysisConfig::from_toml(CONFIG).unwrap();

    let analyzer = Analyzer::uncached(Arc::new(CsvBarSource::new(dir.path())));
    let table = analyzer.features(&config).unwrap();

    let out = dir.path().join("features.csv");
    table
        .write_csv(std::fs::File::create(&out).unwrap())
        .unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "timestamp,close,volume,ema_12,ema_18,ema_200,ema_21,ema_26,ema_4,ema_9,rsi_14,sma_200,sma_50"
    );
    assert_eq!(lines.count(), 260);
}

#[test]
fn range_outside_file_is_no_data() {
    let dir = tempfile::tempdir().unwrap();
    write_bars(dir.path(), "WAVE", 30);
    let mut config = AnalysisConfig::from_toml(CONFIG).unwrap();
    config.analysis.start_date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    config.analysis.end_date = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();

    let analyzer = Analyzer::uncached(Arc::new(CsvBarSource::new(dir.path())));
    assert!(matches!(
        analyzer.analyze(&config),
        Err(AnalysisError::Source(SourceError::NoData { .. }))
    ));
}
