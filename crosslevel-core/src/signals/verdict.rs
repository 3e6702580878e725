//! Buy/sell verdict over the most recent EMA crossover events.

use serde::{Deserialize, Serialize};

use super::crossover::{pair_series, tail, triple_series, CrossoverEvent};
use crate::domain::{closes, Bar};
use crate::indicators::ema_of_series;

/// Default number of trailing bars inspected for crossover events.
pub const DEFAULT_RECENT_BARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossoverVerdict {
    Buy,
    Sell,
    NoSignal,
}

/// Any upward cross wins; otherwise any downward cross sells.
pub fn evaluate_recent(events: &[CrossoverEvent]) -> CrossoverVerdict {
    if events.contains(&CrossoverEvent::Up) {
        CrossoverVerdict::Buy
    } else if events.contains(&CrossoverEvent::Down) {
        CrossoverVerdict::Sell
    } else {
        CrossoverVerdict::NoSignal
    }
}

/// EMA periods for a crossover check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverSetup {
    Pair(usize, usize),
    Triple(usize, usize, usize),
}

impl CrossoverSetup {
    /// Two periods make a pair, three a triple. Anything else is rejected.
    pub fn from_periods(periods: &[usize]) -> Option<Self> {
        match *periods {
            [short, long] => Some(CrossoverSetup::Pair(short, long)),
            [fast, mid, slow] => Some(CrossoverSetup::Triple(fast, mid, slow)),
            _ => None,
        }
    }

    pub fn periods(&self) -> Vec<usize> {
        match *self {
            CrossoverSetup::Pair(a, b) => vec![a, b],
            CrossoverSetup::Triple(a, b, c) => vec![a, b, c],
        }
    }
}

impl Default for CrossoverSetup {
    fn default() -> Self {
        CrossoverSetup::Triple(4, 9, 18)
    }
}

/// Per-bar crossover events of the EMAs named by `setup`.
pub fn ema_crossover_series(bars: &[Bar], setup: CrossoverSetup) -> Vec<CrossoverEvent> {
    let closes = closes(bars);
    match setup {
        CrossoverSetup::Pair(short, long) => {
            pair_series(&ema_of_series(&closes, short), &ema_of_series(&closes, long))
        }
        CrossoverSetup::Triple(fast, mid, slow) => triple_series(
            &ema_of_series(&closes, fast),
            &ema_of_series(&closes, mid),
            &ema_of_series(&closes, slow),
        ),
    }
}

/// The last `k` crossover events of the EMAs named by `setup`.
pub fn ema_crossovers(bars: &[Bar], setup: CrossoverSetup, k: usize) -> Vec<CrossoverEvent> {
    let events = ema_crossover_series(bars, setup);
    tail(&events, k).to_vec()
}
