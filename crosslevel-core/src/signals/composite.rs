//! Composite momentum score in [0, 100].
//!
//! Combines the SMA 50/200 regime with the EMA 9/21 and EMA 12/26
//! positions at the latest bar:
//!
//! raw   = 0.5 * (golden + death) + 0.25 * cross_9_21 + 0.25 * cross_12_26
//! score = (raw + 1) / 2 * 100

use serde::{Deserialize, Serialize};

use crate::domain::{closes, Bar};
use crate::indicators::{ema_of_series, sma_of_series};

/// Components of the score at the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeBreakdown {
    /// 1 when SMA50 > SMA200, else 0.
    pub golden: i8,
    /// -1 when SMA50 < SMA200, else 0.
    pub death: i8,
    pub cross_9_21: i8,
    pub cross_12_26: i8,
    pub raw: f64,
    pub score: f64,
}

fn above_or_below(a: f64, b: f64) -> i8 {
    if a > b {
        1
    } else {
        -1
    }
}

fn last(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(f64::NAN)
}

/// Score from the latest values of the six averages.
///
/// Golden and death are separate flags; with fewer than 200 bars SMA200 is
/// absent and both stay 0.
pub fn score_from_values(
    sma50: f64,
    sma200: f64,
    ema9: f64,
    ema21: f64,
    ema12: f64,
    ema26: f64,
) -> CompositeBreakdown {
    let golden = if sma50 > sma200 { 1 } else { 0 };
    let death = if sma50 < sma200 { -1 } else { 0 };
    let cross_9_21 = above_or_below(ema9, ema21);
    let cross_12_26 = above_or_below(ema12, ema26);

    let raw = 0.5 * f64::from(golden + death)
        + 0.25 * f64::from(cross_9_21)
        + 0.25 * f64::from(cross_12_26);
    let score = (raw + 1.0) / 2.0 * 100.0;

    CompositeBreakdown {
        golden,
        death,
        cross_9_21,
        cross_12_26,
        raw,
        score,
    }
}

/// Composite score at the last bar; `None` for an empty series.
pub fn composite_score(bars: &[Bar]) -> Option<CompositeBreakdown> {
    if bars.is_empty() {
        return None;
    }
    let closes = closes(bars);
    Some(score_from_values(
        last(&sma_of_series(&closes, 50)),
        last(&sma_of_series(&closes, 200)),
        last(&ema_of_series(&closes, 9)),
        last(&ema_of_series(&closes, 21)),
        last(&ema_of_series(&closes, 12)),
        last(&ema_of_series(&closes, 26)),
    ))
}
