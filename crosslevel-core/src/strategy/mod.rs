//! Entry/exit strategy driven by an EMA crossover and the RSI.
//!
//! `run_strategy` precomputes the fast/slow EMA pair and the RSI, derives the
//! two-series crossover events, and feeds every bar through a fresh
//! `StrategyMachine`.

pub mod machine;

pub use machine::{Intent, StrategyMachine, StrategyState};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{closes, Bar};
use crate::indicators::{ema_of_series, Indicator, Rsi};
use crate::signals::pair_series;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Enter on an upward fast/slow EMA cross, exit on a downward one.
    pub use_crossover: bool,
    /// Enter when oversold, exit when overbought.
    pub use_oscillator: bool,
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi_period: usize,
    pub overbought: f64,
    pub oversold: f64,
    /// Fraction of the entry close, e.g. 0.10 for +10%.
    pub take_profit_pct: f64,
    /// Fraction of the entry close, e.g. 0.08 for -8%.
    pub stop_loss_pct: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            use_crossover: true,
            use_oscillator: false,
            fast_period: 10,
            slow_period: 20,
            rsi_period: 14,
            overbought: 70.0,
            oversold: 30.0,
            take_profit_pct: 0.10,
            stop_loss_pct: 0.08,
        }
    }
}

/// A non-`Hold` intent emitted at a specific bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarIntent {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub intent: Intent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    /// Entries and exits in bar order. `Hold` bars are omitted.
    pub intents: Vec<BarIntent>,
    pub final_state: StrategyState,
}

impl StrategyRun {
    pub fn entries(&self) -> usize {
        self.intents
            .iter()
            .filter(|i| matches!(i.intent, Intent::EnterLong { .. }))
            .count()
    }

    pub fn exits(&self) -> usize {
        self.intents
            .iter()
            .filter(|i| i.intent == Intent::ExitLong)
            .count()
    }
}

pub fn run_strategy(bars: &[Bar], config: &StrategyConfig) -> StrategyRun {
    let closes = closes(bars);
    let fast = ema_of_series(&closes, config.fast_period);
    let slow = ema_of_series(&closes, config.slow_period);
    let crossovers = pair_series(&fast, &slow);
    let rsi = Rsi::new(config.rsi_period.max(1)).compute(bars);

    let mut machine = StrategyMachine::new(config.clone());
    let mut intents = Vec::new();
    for (index, bar) in bars.iter().enumerate() {
        let oscillator = Some(rsi[index]).filter(|v| !v.is_nan());
        let intent = machine.on_bar(bar.close, crossovers[index], oscillator);
        if intent != Intent::Hold {
            intents.push(BarIntent {
                index,
                timestamp: bar.timestamp,
                intent,
            });
        }
    }

    debug!(
        bars = bars.len(),
        intents = intents.len(),
        "strategy run complete"
    );

    StrategyRun {
        intents,
        final_state: machine.state(),
    }
}
