//! Analysis orchestration: load bars, run the engine, cache the results.
//!
//! `Analyzer` pairs a `BarSource` with a `ResultCache`. Every operation is
//! keyed by its name, the source name and the full `AnalysisConfig`, so
//! repeating a request within the TTL skips both the fetch and the engine.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crosslevel_core::domain::{validate_series, Bar, BarError};
use crosslevel_core::indicators::{standard_set, Indicator, Rsi};
use crosslevel_core::pivots::{analyze_pivots, window_range, SrLevel};
use crosslevel_core::signals::{
    composite_score, ema_crossovers, ema_trend, evaluate_recent, evaluate_semaphores,
    CompositeBreakdown, CrossoverEvent, CrossoverSetup, CrossoverVerdict, SemaphoreReading, Trend,
};
use crosslevel_core::strategy::{run_strategy, BarIntent, StrategyRun, StrategyState};
use crosslevel_core::{require_history, EngineError};

use crate::cache::{cache_key, NoCache, ResultCache};
use crate::chart::{chart_payload, ChartPayload};
use crate::config::{AnalysisConfig, ConfigError};
use crate::features::FeatureTable;
use crate::returns::{monthly_returns, MonthlyReturn};
use crate::source::{BarSource, DataOrigin, SourceError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid bar series: {0}")]
    Bars(#[from] BarError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ─── Report types ───────────────────────────────────────────────────

/// Semaphores, recent crossovers and the scalar signal readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub semaphores: Vec<SemaphoreReading>,
    pub crossover_setup: CrossoverSetup,
    /// Events of the last `crossovers.lookback` bars, oldest first.
    pub recent_crossovers: Vec<CrossoverEvent>,
    pub verdict: CrossoverVerdict,
    pub composite: Option<CompositeBreakdown>,
    pub trend: Trend,
    /// RSI at the final bar, absent during warmup.
    pub latest_rsi: Option<f64>,
    /// Recent candles and EMAs, attached only to a buy or sell verdict.
    #[serde(default)]
    pub chart: Option<ChartPayload>,
}

/// Support/resistance output without the raw window bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotSummary {
    pub window_bars: usize,
    pub markers: usize,
    pub limit: f64,
    pub limit_fallback: bool,
    pub levels: Vec<SrLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub entries: usize,
    pub exits: usize,
    pub final_state: StrategyState,
    pub intents: Vec<BarIntent>,
}

impl From<StrategyRun> for StrategySummary {
    fn from(run: StrategyRun) -> Self {
        Self {
            entries: run.entries(),
            exits: run.exits(),
            final_state: run.final_state,
            intents: run.intents,
        }
    }
}

/// Everything one analysis run produces for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub instrument: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub source: String,
    pub origin: DataOrigin,
    pub synthetic: bool,
    pub bar_count: usize,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
    pub signals: SignalSummary,
    pub pivots: PivotSummary,
    pub strategy: StrategySummary,
}

// ─── Engine passes ──────────────────────────────────────────────────

pub fn signal_summary(bars: &[Bar], config: &AnalysisConfig) -> Result<SignalSummary, AnalysisError> {
    let setup = config.crossover_setup()?;
    let recent_crossovers = ema_crossovers(bars, setup, config.crossovers.lookback);
    let rsi = Rsi::new(config.strategy.rsi_period).compute(bars);
    let verdict = evaluate_recent(&recent_crossovers);
    let chart = (verdict != CrossoverVerdict::NoSignal).then(|| chart_payload(bars, setup));

    Ok(SignalSummary {
        semaphores: evaluate_semaphores(bars, &config.semaphores),
        crossover_setup: setup,
        verdict,
        recent_crossovers,
        composite: composite_score(bars),
        trend: ema_trend(bars),
        latest_rsi: rsi.last().copied().filter(|v| !v.is_nan()),
        chart,
    })
}

pub fn pivot_summary(bars: &[Bar], config: &AnalysisConfig) -> PivotSummary {
    let analysis = analyze_pivots(bars, &config.pivots);
    let range = window_range(analysis.points.len(), config.pivots.window);
    let markers = analysis.points[range]
        .iter()
        .filter(|p| p.position.is_some())
        .count();

    PivotSummary {
        window_bars: analysis.window.len(),
        markers,
        limit: analysis.limit,
        limit_fallback: analysis.limit_fallback,
        levels: analysis.levels,
    }
}

// ─── Analyzer ───────────────────────────────────────────────────────

pub struct Analyzer {
    source: Arc<dyn BarSource>,
    cache: Arc<dyn ResultCache>,
    min_history: usize,
}

impl Analyzer {
    pub fn new(source: Arc<dyn BarSource>, cache: Arc<dyn ResultCache>) -> Self {
        Self {
            source,
            cache,
            min_history: 1,
        }
    }

    /// Analyzer that recomputes every request.
    pub fn uncached(source: Arc<dyn BarSource>) -> Self {
        Self::new(source, Arc::new(NoCache))
    }

    /// Fail with `InsufficientData` below `bars` bars instead of reporting
    /// absent readings.
    pub fn with_min_history(mut self, bars: usize) -> Self {
        self.min_history = bars.max(1);
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Validate the config, then fetch and validate the configured range.
    pub fn load_bars(&self, config: &AnalysisConfig) -> Result<Vec<Bar>, AnalysisError> {
        config.validate()?;
        let a = &config.analysis;
        let bars = self.source.fetch(&a.instrument, a.start_date, a.end_date)?;
        validate_series(&bars)?;
        require_history(&bars, self.min_history)?;
        debug!(
            instrument = %a.instrument,
            source = self.source.name(),
            bars = bars.len(),
            "bars loaded"
        );
        Ok(bars)
    }

    /// Full report: signals, pivots and the strategy run.
    pub fn analyze(&self, config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
        self.cached("analyze", config, |bars| {
            let a = &config.analysis;
            let origin = self.source.origin();
            Ok(AnalysisReport {
                instrument: a.instrument.clone(),
                start_date: a.start_date,
                end_date: a.end_date,
                source: self.source.name().to_string(),
                origin,
                synthetic: origin == DataOrigin::Synthetic,
                bar_count: bars.len(),
                first_bar: bars.first().map(|b| b.timestamp),
                last_bar: bars.last().map(|b| b.timestamp),
                signals: signal_summary(bars, config)?,
                pivots: pivot_summary(bars, config),
                strategy: run_strategy(bars, &config.strategy).into(),
            })
        })
    }

    pub fn signals(&self, config: &AnalysisConfig) -> Result<SignalSummary, AnalysisError> {
        self.cached("signals", config, |bars| signal_summary(bars, config))
    }

    pub fn pivots(&self, config: &AnalysisConfig) -> Result<PivotSummary, AnalysisError> {
        self.cached("pivots", config, |bars| Ok(pivot_summary(bars, config)))
    }

    pub fn strategy(&self, config: &AnalysisConfig) -> Result<StrategyRun, AnalysisError> {
        self.cached("strategy", config, |bars| Ok(run_strategy(bars, &config.strategy)))
    }

    /// Year × month grid of month-over-month close returns.
    pub fn monthly_returns(&self, config: &AnalysisConfig) -> Result<Vec<MonthlyReturn>, AnalysisError> {
        self.cached("monthly_returns", config, |bars| Ok(monthly_returns(bars)))
    }

    /// Feature table over the standard indicator set. Not cached.
    pub fn features(&self, config: &AnalysisConfig) -> Result<FeatureTable, AnalysisError> {
        self.features_with(config, &standard_set())
    }

    pub fn features_with(
        &self,
        config: &AnalysisConfig,
        indicators: &[Box<dyn Indicator>],
    ) -> Result<FeatureTable, AnalysisError> {
        let bars = self.load_bars(config)?;
        Ok(FeatureTable::from_bars(&bars, indicators))
    }

    /// Analyze independent instruments in parallel. Results keep input order.
    pub fn analyze_many(
        &self,
        configs: &[AnalysisConfig],
    ) -> Vec<Result<AnalysisReport, AnalysisError>> {
        configs.par_iter().map(|c| self.analyze(c)).collect()
    }

    fn cached<T, F>(&self, operation: &str, config: &AnalysisConfig, compute: F) -> Result<T, AnalysisError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&[Bar]) -> Result<T, AnalysisError>,
    {
        config.validate()?;
        let key = cache_key(operation, &(self.source.name(), config))?;
        let instrument = config.analysis.instrument.as_str();

        if let Some(hit) = self.cache.get(&key) {
            match serde_json::from_str(&hit) {
                Ok(value) => {
                    info!(operation, instrument, "cache hit");
                    return Ok(value);
                }
                Err(e) => warn!(operation, instrument, error = %e, "discarding unreadable cache entry"),
            }
        }

        info!(operation, instrument, source = self.source.name(), "cache miss, running analysis");
        let bars = self.load_bars(config)?;
        let value = compute(&bars)?;
        self.cache
            .set_with_ttl(&key, serde_json::to_string(&value)?, config.cache_ttl());
        Ok(value)
    }
}
