//! Candle and EMA series for plotting a crossover verdict.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crosslevel_core::domain::{closes, Bar};
use crosslevel_core::indicators::ema_of_series;
use crosslevel_core::signals::CrossoverSetup;

/// Trailing bars included in a chart payload.
pub const CHART_BARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// One EMA aligned with the payload's candles. NaN values serialize as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaLine {
    pub period: usize,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub candles: Vec<Candle>,
    pub ema: Vec<EmaLine>,
}

/// The last `CHART_BARS` candles with the setup's EMAs over the same bars.
///
/// EMAs run over the whole series before the tail is cut, so the plotted
/// values match the ones the verdict was computed from.
pub fn chart_payload(bars: &[Bar], setup: CrossoverSetup) -> ChartPayload {
    let start = bars.len().saturating_sub(CHART_BARS);
    let closes = closes(bars);

    let candles = bars[start..]
        .iter()
        .map(|b| Candle {
            timestamp: b.timestamp,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
        })
        .collect();

    let ema = setup
        .periods()
        .into_iter()
        .map(|period| EmaLine {
            period,
            values: ema_of_series(&closes, period)[start..]
                .iter()
                .map(|v| Some(*v).filter(|v| !v.is_nan()))
                .collect(),
        })
        .collect();

    ChartPayload { candles, ema }
}
