//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0; both → 50.

use super::Indicator;
use crate::domain::Bar;

/// How average gain and loss are carried past the seed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiSmoothing {
    /// Wilder smoothing: avg = (avg * (n - 1) + x) / n.
    Wilder,
    /// Plain rolling mean of the last n gains and losses.
    Simple,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: RsiSmoothing,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self::with_smoothing(period, RsiSmoothing::Wilder)
    }

    pub fn simple(period: usize) -> Self {
        Self::with_smoothing(period, RsiSmoothing::Simple)
    }

    fn with_smoothing(period: usize, smoothing: RsiSmoothing) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        let name = match smoothing {
            RsiSmoothing::Wilder => format!("rsi_{period}"),
            RsiSmoothing::Simple => format!("rsi_simple_{period}"),
        };
        Self {
            period,
            smoothing,
            name,
        }
    }

    pub fn smoothing(&self) -> RsiSmoothing {
        self.smoothing
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        let period = self.period;

        if n < period + 1 {
            return result;
        }

        // changes[i] = close[i] - close[i-1]; changes[0] is undefined.
        let mut changes = vec![f64::NAN; n];
        for i in 1..n {
            changes[i] = bars[i].close - bars[i - 1].close;
        }

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[1..=period] {
            if ch.is_nan() {
                return result;
            }
            avg_gain += gain(ch);
            avg_loss += loss(ch);
        }
        avg_gain /= period as f64;
        avg_loss /= period as f64;

        result[period] = compute_rsi(avg_gain, avg_loss);

        let alpha = 1.0 / period as f64;
        for i in (period + 1)..n {
            let ch = changes[i];
            if ch.is_nan() {
                // NaN poisons the remainder.
                return result;
            }

            match self.smoothing {
                RsiSmoothing::Wilder => {
                    avg_gain = alpha * gain(ch) + (1.0 - alpha) * avg_gain;
                    avg_loss = alpha * loss(ch) + (1.0 - alpha) * avg_loss;
                }
                RsiSmoothing::Simple => {
                    let leaving = changes[i - period];
                    avg_gain += (gain(ch) - gain(leaving)) / period as f64;
                    avg_loss += (loss(ch) - loss(leaving)) / period as f64;
                    // Rolling sums drift below zero by rounding.
                    avg_gain = avg_gain.max(0.0);
                    avg_loss = avg_loss.max(0.0);
                }
            }

            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn gain(ch: f64) -> f64 {
    if ch > 0.0 {
        ch
    } else {
        0.0
    }
}

fn loss(ch: f64) -> f64 {
    if ch < 0.0 {
        -ch
    } else {
        0.0
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    const TINY: f64 = 1e-12;
    if avg_loss <= TINY && avg_gain <= TINY {
        50.0 // no movement
    } else if avg_loss <= TINY {
        100.0
    } else if avg_gain <= TINY {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
