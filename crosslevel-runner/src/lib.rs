//! Crosslevel Runner: bar sources, configuration, result caching and
//! analysis orchestration on top of `crosslevel-core`.
//!
//! This crate provides:
//! - Bar sources (CSV directory, synthetic random walk, in-memory)
//! - TOML analysis configuration with validation
//! - An expiring result cache keyed by operation and parameters, in memory or on disk
//! - The `Analyzer`, which runs signals, pivots and the strategy per instrument
//! - Monthly return grids and chart payloads for presentation
//! - Feature table export for model training

pub mod analysis;
pub mod cache;
pub mod chart;
pub mod config;
pub mod features;
pub mod returns;
pub mod source;

pub use analysis::{
    pivot_summary, signal_summary, AnalysisError, AnalysisReport, Analyzer, PivotSummary,
    SignalSummary, StrategySummary,
};
pub use cache::{cache_key, FileCache, MemoryCache, NoCache, ResultCache, DEFAULT_TTL};
pub use chart::{chart_payload, Candle, ChartPayload, EmaLine, CHART_BARS};
pub use config::{AnalysisConfig, AnalysisSection, ConfigError, CrossoverSection};
pub use features::{FeatureColumn, FeatureTable};
pub use returns::{monthly_returns, MonthlyReturn};
pub use source::{
    parse_timestamp, BarSource, CsvBarSource, DataOrigin, MemorySource, SourceError,
    SyntheticSource,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn analyzer_is_send_sync() {
        assert_send::<Analyzer>();
        assert_sync::<Analyzer>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<AnalysisReport>();
        assert_sync::<AnalysisReport>();
        assert_send::<FeatureTable>();
        assert_sync::<FeatureTable>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<AnalysisConfig>();
        assert_sync::<AnalysisConfig>();
    }

    #[test]
    fn caches_are_send_sync() {
        assert_send::<MemoryCache>();
        assert_sync::<MemoryCache>();
        assert_send::<NoCache>();
        assert_sync::<NoCache>();
        assert_send::<FileCache>();
        assert_sync::<FileCache>();
    }

    #[test]
    fn sources_are_send_sync() {
        assert_send::<CsvBarSource>();
        assert_sync::<CsvBarSource>();
        assert_send::<SyntheticSource>();
        assert_sync::<SyntheticSource>();
        assert_send::<MemorySource>();
        assert_sync::<MemorySource>();
    }
}
