//! Windowed signal classifier and the fast/medium/slow semaphores.
//!
//! The relative position of two series is encoded as +1 (short above long) or
//! -1 (otherwise, NaN included). Its first difference is +2 on an upward
//! cross and -2 on a downward one. The classifier inspects the last `k`
//! differences.

use serde::{Deserialize, Serialize};

use crate::domain::{closes, Bar};
use crate::indicators::ema_of_series;

/// Discrete market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
}

impl Signal {
    /// +1, -1 or 0.
    pub fn value(&self) -> i8 {
        match self {
            Signal::Bullish => 1,
            Signal::Bearish => -1,
            Signal::Neutral => 0,
        }
    }
}

fn position(short: f64, long: f64) -> i8 {
    if short > long {
        1
    } else {
        -1
    }
}

/// Classify the last `k` bars of two aligned series.
///
/// Both an upward and a downward cross inside the window cancel out to
/// `Neutral`. The first bar has no predecessor and never counts.
pub fn classify_window(short: &[f64], long: &[f64], k: usize) -> Signal {
    let n = short.len().min(long.len());
    if k == 0 || n < 2 {
        return Signal::Neutral;
    }

    let start = n.saturating_sub(k).max(1);
    let mut bullish = false;
    let mut bearish = false;
    for i in start..n {
        let delta = position(short[i], long[i]) - position(short[i - 1], long[i - 1]);
        match delta {
            2 => bullish = true,
            -2 => bearish = true,
            _ => {}
        }
    }

    match (bullish, bearish) {
        (true, false) => Signal::Bullish,
        (false, true) => Signal::Bearish,
        _ => Signal::Neutral,
    }
}

/// EMA(short_span) vs EMA(long_span) over closes, classified over the last `k` bars.
pub fn ema_signal(bars: &[Bar], short_span: usize, long_span: usize, k: usize) -> Signal {
    let closes = closes(bars);
    let short = ema_of_series(&closes, short_span);
    let long = ema_of_series(&closes, long_span);
    classify_window(&short, &long, k)
}

/// A named EMA pair evaluated with the windowed classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semaphore {
    pub name: String,
    pub short_span: usize,
    pub long_span: usize,
    #[serde(default = "default_lookback")]
    pub lookback: usize,
}

fn default_lookback() -> usize {
    5
}

impl Semaphore {
    pub fn new(name: impl Into<String>, short_span: usize, long_span: usize, lookback: usize) -> Self {
        Self {
            name: name.into(),
            short_span,
            long_span,
            lookback,
        }
    }

    pub fn fast() -> Self {
        Self::new("fast", 4, 9, 5)
    }

    pub fn medium() -> Self {
        Self::new("medium", 9, 21, 5)
    }

    pub fn slow() -> Self {
        Self::new("slow", 50, 200, 5)
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::fast(), Self::medium(), Self::slow()]
    }

    pub fn evaluate(&self, bars: &[Bar]) -> SemaphoreReading {
        SemaphoreReading {
            name: self.name.clone(),
            short_span: self.short_span,
            long_span: self.long_span,
            signal: ema_signal(bars, self.short_span, self.long_span, self.lookback),
        }
    }
}

/// Result of one semaphore on one bar series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemaphoreReading {
    pub name: String,
    pub short_span: usize,
    pub long_span: usize,
    pub signal: Signal,
}

pub fn evaluate_semaphores(bars: &[Bar], semaphores: &[Semaphore]) -> Vec<SemaphoreReading> {
    semaphores.iter().map(|s| s.evaluate(bars)).collect()
}
