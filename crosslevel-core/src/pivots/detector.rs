//! Pivot classification over a symmetric neighborhood.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PivotKind {
    #[default]
    None,
    Low,
    High,
    /// Extremal on both sides at once. Carries no marker.
    Both,
}

/// A classified bar. `index` refers to the series the pivots were detected on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotPoint {
    pub index: usize,
    pub kind: PivotKind,
    /// `low - ε` for a Low pivot, `high + ε` for a High pivot.
    pub position: Option<f64>,
}

/// Drop zero-volume (non-trading) bars. Indices are renumbered.
pub fn filter_trading(bars: &[Bar]) -> Vec<Bar> {
    bars.iter().filter(|b| b.is_trading()).cloned().collect()
}

/// Classify bar `l` against `back` bars before and `forward` bars after it.
///
/// Bars without a full neighborhood on both sides are never pivots.
pub fn classify(bars: &[Bar], l: usize, back: usize, forward: usize) -> PivotKind {
    if l < back || l + forward >= bars.len() {
        return PivotKind::None;
    }

    let pivot = &bars[l];
    let neighborhood = &bars[l - back..=l + forward];
    let is_low = neighborhood.iter().all(|b| pivot.low <= b.low);
    let is_high = neighborhood.iter().all(|b| pivot.high >= b.high);

    match (is_low, is_high) {
        (true, true) => PivotKind::Both,
        (true, false) => PivotKind::Low,
        (false, true) => PivotKind::High,
        (false, false) => PivotKind::None,
    }
}

/// Marker price for a pivot kind.
pub fn marker(bar: &Bar, kind: PivotKind, epsilon: f64) -> Option<f64> {
    match kind {
        PivotKind::Low => Some(bar.low - epsilon),
        PivotKind::High => Some(bar.high + epsilon),
        PivotKind::Both | PivotKind::None => None,
    }
}

/// One `PivotPoint` per bar, markers placed `epsilon` outside the bar's range.
pub fn detect_pivots(bars: &[Bar], back: usize, forward: usize, epsilon: f64) -> Vec<PivotPoint> {
    (0..bars.len())
        .map(|index| {
            let kind = classify(bars, index, back, forward);
            PivotPoint {
                index,
                kind,
                position: marker(&bars[index], kind, epsilon),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn local_low_in_valley() {
        let bars = make_bars(&[5.0, 4.0, 3.0, 4.0, 5.0]);
        assert_eq!(classify(&bars, 2, 2, 2), PivotKind::Low);
        // Bar 1 opens at 5.0 so its high ties bar 0's high; ties count.
        assert_eq!(classify(&bars, 1, 1, 1), PivotKind::High);
    }

    #[test]
    fn steady_decline_has_no_interior_pivot() {
        // highs 6,6,5,4,3 and lows 4,3,2,1,0
        let bars = make_bars(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(classify(&bars, 2, 1, 1), PivotKind::None);
        assert_eq!(classify(&bars, 3, 1, 1), PivotKind::None);
    }

    #[test]
    fn edges_are_never_pivots() {
        let bars = make_bars(&[5.0, 4.0, 3.0, 4.0, 5.0]);
        assert_eq!(classify(&bars, 0, 2, 2), PivotKind::None);
        assert_eq!(classify(&bars, 1, 2, 2), PivotKind::None);
        assert_eq!(classify(&bars, 3, 2, 2), PivotKind::None);
        assert_eq!(classify(&bars, 4, 2, 2), PivotKind::None);
    }

    #[test]
    fn flat_series_is_both() {
        let bars = make_bars(&[10.0; 5]);
        assert_eq!(classify(&bars, 2, 2, 2), PivotKind::Both);
        let points = detect_pivots(&bars, 2, 2, 1e-3);
        assert_eq!(points[2].kind, PivotKind::Both);
        assert_eq!(points[2].position, None);
    }

    #[test]
    fn markers_sit_outside_the_bar() {
        let bars = make_bars(&[10.0]);
        let bar = &bars[0];
        assert_eq!(marker(bar, PivotKind::Low, 0.5), Some(bar.low - 0.5));
        assert_eq!(marker(bar, PivotKind::High, 0.5), Some(bar.high + 0.5));
        assert_eq!(marker(bar, PivotKind::None, 0.5), None);
    }

    #[test]
    fn window_larger_than_history() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let points = detect_pivots(&bars, 10, 10, 1e-3);
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.kind == PivotKind::None));
    }

    #[test]
    fn zero_volume_bars_are_dropped() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[1].volume = 0;
        let trading = filter_trading(&bars);
        assert_eq!(trading.len(), 2);
        assert_eq!(trading[1].close, 3.0);
    }
}
