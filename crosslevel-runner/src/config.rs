//! Serializable analysis configuration, loaded from TOML.
//!
//! Only `[analysis]` is required. The other sections fall back to the
//! engine defaults:
//!
//! ```toml
//! [analysis]
//! instrument = "AAPL"
//! start_date = "2023-01-02"
//! end_date = "2024-12-31"
//!
//! [[semaphores]]
//! name = "fast"
//! short_span = 4
//! long_span = 9
//!
//! [crossovers]
//! periods = [4, 9, 18]
//!
//! [pivots]
//! window = 300
//!
//! [strategy]
//! use_crossover = true
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crosslevel_core::pivots::PivotConfig;
use crosslevel_core::signals::{CrossoverSetup, Semaphore, DEFAULT_RECENT_BARS};
use crosslevel_core::strategy::StrategyConfig;

use crate::cache::DEFAULT_TTL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Instrument and date range under analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub instrument: String,
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default = "default_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

/// EMA periods and lookback for the recent-crossover verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossoverSection {
    /// Two periods for a pair, three for a triple.
    pub periods: Vec<usize>,
    pub lookback: usize,
}

impl Default for CrossoverSection {
    fn default() -> Self {
        Self {
            periods: CrossoverSetup::default().periods(),
            lookback: DEFAULT_RECENT_BARS,
        }
    }
}

impl CrossoverSection {
    pub fn setup(&self) -> Option<CrossoverSetup> {
        CrossoverSetup::from_periods(&self.periods)
    }
}

/// Complete configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub analysis: AnalysisSection,
    #[serde(default = "Semaphore::defaults")]
    pub semaphores: Vec<Semaphore>,
    #[serde(default)]
    pub crossovers: CrossoverSection,
    #[serde(default)]
    pub pivots: PivotConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

impl AnalysisConfig {
    /// Defaults for everything but the instrument and range.
    pub fn new(instrument: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            analysis: AnalysisSection {
                instrument: instrument.into(),
                start_date,
                end_date,
                cache_ttl_secs: default_ttl_secs(),
            },
            semaphores: Semaphore::defaults(),
            crossovers: CrossoverSection::default(),
            pivots: PivotConfig::default(),
            strategy: StrategyConfig::default(),
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.analysis.cache_ttl_secs)
    }

    pub fn crossover_setup(&self) -> Result<CrossoverSetup, ConfigError> {
        self.crossovers.setup().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "crossovers.periods must hold 2 or 3 periods, got {}",
                self.crossovers.periods.len()
            ))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if a.instrument.trim().is_empty() {
            return Err(invalid("analysis.instrument is empty"));
        }
        if a.start_date > a.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                a.start_date, a.end_date
            )));
        }

        for s in &self.semaphores {
            if s.short_span == 0 || s.long_span == 0 || s.lookback == 0 {
                return Err(ConfigError::Invalid(format!(
                    "semaphore '{}': spans and lookback must be >= 1",
                    s.name
                )));
            }
            if s.short_span >= s.long_span {
                return Err(ConfigError::Invalid(format!(
                    "semaphore '{}': short_span {} must be < long_span {}",
                    s.name, s.short_span, s.long_span
                )));
            }
        }

        self.crossover_setup()?;
        if self.crossovers.periods.contains(&0) {
            return Err(invalid("crossovers.periods must be >= 1"));
        }
        if self.crossovers.lookback == 0 {
            return Err(invalid("crossovers.lookback must be >= 1"));
        }

        let p = &self.pivots;
        if p.window == 0 {
            return Err(invalid("pivots.window must be >= 1"));
        }
        if !positive(p.epsilon) || !positive(p.limit_fallback) {
            return Err(invalid("pivots.epsilon and pivots.limit_fallback must be > 0"));
        }

        let s = &self.strategy;
        if s.fast_period == 0 || s.slow_period == 0 || s.rsi_period == 0 {
            return Err(invalid("strategy periods must be >= 1"));
        }
        if s.fast_period >= s.slow_period {
            return Err(ConfigError::Invalid(format!(
                "strategy.fast_period {} must be < slow_period {}",
                s.fast_period, s.slow_period
            )));
        }
        for (name, pct) in [
            ("take_profit_pct", s.take_profit_pct),
            ("stop_loss_pct", s.stop_loss_pct),
        ] {
            if !(pct > 0.0 && pct < 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "strategy.{name} must be in (0, 1), got {pct}"
                )));
            }
        }
        if s.oversold >= s.overbought {
            return Err(invalid("strategy.oversold must be below strategy.overbought"));
        }

        Ok(())
    }
}

fn positive(x: f64) -> bool {
    x > 0.0
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}
