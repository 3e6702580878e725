//! Indicator engine: moving averages and the RSI-style oscillator.
//!
//! Indicators are pure functions: bar history in, numeric series out. Every
//! output series has the same length as the input and uses `f64::NAN` for
//! absent (warm-up) values.
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on price data from bar t+1 or later.
//! Every indicator must pass the truncated-vs-full series test.

pub mod ema;
pub mod rsi;
pub mod sma;
pub mod values;

pub use ema::{ema_of_series, Ema};
pub use rsi::{Rsi, RsiSmoothing};
pub use sma::{sma_of_series, Sma};
pub use values::IndicatorValues;

use crate::domain::Bar;

/// Trait for indicators.
pub trait Indicator: Send + Sync {
    /// Series name (e.g., "sma_50", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are `NaN` in the output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Compute every indicator once and collect the series by name.
pub fn precompute(bars: &[Bar], indicators: &[Box<dyn Indicator>]) -> IndicatorValues {
    let mut iv = IndicatorValues::new();
    for indicator in indicators {
        let series = indicator.compute(bars);
        debug_assert_eq!(
            series.len(),
            bars.len(),
            "indicator '{}' produced {} values for {} bars",
            indicator.name(),
            series.len(),
            bars.len()
        );
        iv.insert(indicator.name(), series);
    }
    iv
}

/// Longest warm-up across a set of indicators.
pub fn warmup(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

/// The indicators used by the analysis: composite score inputs, the triple
/// EMA crossover set, the long-run EMA and the 14-bar oscillator.
pub fn standard_set() -> Vec<Box<dyn Indicator>> {
    vec![
        Box::new(Sma::new(50)),
        Box::new(Sma::new(200)),
        Box::new(Ema::new(4)),
        Box::new(Ema::new(9)),
        Box::new(Ema::new(12)),
        Box::new(Ema::new(18)),
        Box::new(Ema::new(21)),
        Box::new(Ema::new(26)),
        Box::new(Ema::new(200)),
        Box::new(Rsi::new(14)),
    ]
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precompute_names_series() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let indicators: Vec<Box<dyn Indicator>> =
            vec![Box::new(Sma::new(3)), Box::new(Ema::new(3))];
        let iv = precompute(&bars, &indicators);

        assert_eq!(iv.len(), 2);
        assert!(iv.get("sma_3", 1).unwrap().is_nan());
        assert_approx(iv.get("sma_3", 2).unwrap(), 11.0, DEFAULT_EPSILON);
        assert_approx(iv.get("ema_3", 0).unwrap(), 10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn warmup_is_max_lookback() {
        assert_eq!(warmup(&standard_set()), 199);
        assert_eq!(warmup(&[]), 0);
    }

    #[test]
    fn standard_set_names_are_unique() {
        let set = standard_set();
        let mut names: Vec<&str> = set.iter().map(|i| i.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), set.len());
    }
}
