//! Short-term trend from the last three EMA9/EMA21 pairs.

use serde::{Deserialize, Serialize};

use crate::domain::{closes, Bar};
use crate::indicators::ema_of_series;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    /// EMA9 has stayed below EMA21 for the last three bars.
    ApproachingFromBelow,
    /// EMA9 has stayed above EMA21 for the last three bars.
    ApproachingFromAbove,
    NoTrend,
}

const TREND_BARS: usize = 3;

/// Classify the last three aligned values of EMA9 and EMA21.
pub fn classify_trend(ema9: &[f64], ema21: &[f64]) -> Trend {
    let n = ema9.len().min(ema21.len());
    if n < TREND_BARS {
        return Trend::NoTrend;
    }

    let pairs = || (n - TREND_BARS..n).map(|i| (ema9[i], ema21[i]));
    if pairs().all(|(a, b)| a < b) {
        Trend::ApproachingFromBelow
    } else if pairs().all(|(a, b)| a > b) {
        Trend::ApproachingFromAbove
    } else {
        Trend::NoTrend
    }
}

pub fn ema_trend(bars: &[Bar]) -> Trend {
    let closes = closes(bars);
    classify_trend(&ema_of_series(&closes, 9), &ema_of_series(&closes, 21))
}
