//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single instrument at a single timestamp.
///
/// Bars are immutable once produced by a bar source. Timestamps are unique and
/// strictly increasing within a series; the engine relies on this and never
/// re-sorts or de-duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Zero-volume bars are placeholders for non-trading sessions.
    pub fn is_trading(&self) -> bool {
        self.volume != 0
    }
}

/// Malformed bar series. Raised by sources and the runner, never inside the
/// numeric core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarError {
    #[error("bar series is empty")]
    Empty,

    #[error("timestamps not strictly increasing at bar {index}")]
    NonMonotonic { index: usize },
}

/// Check that a series is non-empty and strictly time-ordered.
pub fn validate_series(bars: &[Bar]) -> Result<(), BarError> {
    if bars.is_empty() {
        return Err(BarError::Empty);
    }
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(BarError::NonMonotonic { index: i + 1 });
        }
    }
    Ok(())
}

/// Extract the close column.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
