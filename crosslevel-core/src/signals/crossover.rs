//! Crossover detection between moving-average series.
//!
//! An event at bar t compares the values at t-1 and t. Bar 0 has no
//! predecessor and never carries an event.

use serde::{Deserialize, Serialize};

/// Crossover event at a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CrossoverEvent {
    /// Short series crossed above the long series.
    Up,
    /// Short series crossed below the long series.
    Down,
    #[default]
    None,
}

impl CrossoverEvent {
    pub fn is_event(&self) -> bool {
        !matches!(self, CrossoverEvent::None)
    }
}

/// Two-series crossover rule.
///
/// Up: short was at or below long and is now strictly above.
/// Down: short was at or above long and is now strictly below.
pub fn detect_pair(short_prev: f64, long_prev: f64, short_cur: f64, long_cur: f64) -> CrossoverEvent {
    if [short_prev, long_prev, short_cur, long_cur]
        .iter()
        .any(|v| v.is_nan())
    {
        return CrossoverEvent::None;
    }

    if short_prev <= long_prev && short_cur > long_cur {
        CrossoverEvent::Up
    } else if short_prev >= long_prev && short_cur < long_cur {
        CrossoverEvent::Down
    } else {
        CrossoverEvent::None
    }
}

/// Three-series crossover rule over `[fast, mid, slow]`.
///
/// Up requires the fast series to clear both the mid and the slow series.
/// Down only requires the fast series to drop below the mid series; the slow
/// series is checked on the previous bar but not the current one.
pub fn detect_triple(prev: [f64; 3], cur: [f64; 3]) -> CrossoverEvent {
    if prev.iter().chain(cur.iter()).any(|v| v.is_nan()) {
        return CrossoverEvent::None;
    }

    let [fast_prev, mid_prev, slow_prev] = prev;
    let [fast_cur, mid_cur, slow_cur] = cur;

    if fast_prev <= mid_prev && fast_prev <= slow_prev && fast_cur > mid_cur && fast_cur > slow_cur {
        CrossoverEvent::Up
    } else if fast_prev >= mid_prev && fast_prev >= slow_prev && fast_cur < mid_cur {
        CrossoverEvent::Down
    } else {
        CrossoverEvent::None
    }
}

/// Per-bar events for two aligned series. Index 0 is always `None`.
pub fn pair_series(short: &[f64], long: &[f64]) -> Vec<CrossoverEvent> {
    let n = short.len().min(long.len());
    let mut events = vec![CrossoverEvent::None; n];
    for i in 1..n {
        events[i] = detect_pair(short[i - 1], long[i - 1], short[i], long[i]);
    }
    events
}

/// Per-bar events for three aligned series. Index 0 is always `None`.
pub fn triple_series(fast: &[f64], mid: &[f64], slow: &[f64]) -> Vec<CrossoverEvent> {
    let n = fast.len().min(mid.len()).min(slow.len());
    let mut events = vec![CrossoverEvent::None; n];
    for i in 1..n {
        events[i] = detect_triple(
            [fast[i - 1], mid[i - 1], slow[i - 1]],
            [fast[i], mid[i], slow[i]],
        );
    }
    events
}

/// The last `k` events (all of them when fewer than `k` exist).
pub fn tail(events: &[CrossoverEvent], k: usize) -> &[CrossoverEvent] {
    &events[events.len().saturating_sub(k)..]
}
