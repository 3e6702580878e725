//! Support/resistance levels from clustered pivots.
//!
//! Pipeline: drop non-trading bars → classify every bar → cut the analysis
//! window → derive the matching tolerance → pair up same-type markers.
//! Works on raw bars, never on indicator output.

pub mod clustering;
pub mod detector;

pub use clustering::{cluster_levels, tolerance, LevelKind, SrLevel};
pub use detector::{classify, detect_pivots, filter_trading, marker, PivotKind, PivotPoint};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    /// Bars before the candidate.
    pub back: usize,
    /// Bars after the candidate.
    pub forward: usize,
    /// Marker offset outside the bar's range.
    pub epsilon: f64,
    /// Number of trailing bars in the analysis window (the final bar is then dropped).
    pub window: usize,
    /// Tolerance used when the window holds no markers.
    pub limit_fallback: f64,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            back: 10,
            forward: 10,
            epsilon: 1e-3,
            window: 300,
            limit_fallback: 1e-3,
        }
    }
}

/// Everything the pivot pipeline produces for one bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotAnalysis {
    /// One point per trading bar; indices refer to the filtered series.
    pub points: Vec<PivotPoint>,
    /// Bars of the analysis window.
    pub window: Vec<Bar>,
    pub limit: f64,
    /// True when `limit` is the fallback constant.
    pub limit_fallback: bool,
    pub levels: Vec<SrLevel>,
}

impl PivotAnalysis {
    pub fn high_levels(&self) -> impl Iterator<Item = &SrLevel> {
        self.levels.iter().filter(|l| l.kind == LevelKind::High)
    }

    pub fn low_levels(&self) -> impl Iterator<Item = &SrLevel> {
        self.levels.iter().filter(|l| l.kind == LevelKind::Low)
    }
}

/// Index range of the analysis window: the last `window` bars minus the final one.
pub fn window_range(len: usize, window: usize) -> std::ops::Range<usize> {
    let end = len.saturating_sub(1);
    let start = len.saturating_sub(window).min(end);
    start..end
}

pub fn analyze_pivots(bars: &[Bar], config: &PivotConfig) -> PivotAnalysis {
    let trading = filter_trading(bars);
    let points = detect_pivots(&trading, config.back, config.forward, config.epsilon);

    let range = window_range(trading.len(), config.window);
    let window_points = &points[range.clone()];
    let (limit, limit_fallback) = tolerance(window_points, config.limit_fallback);
    if limit_fallback {
        debug!(
            window = range.len(),
            fallback = limit,
            "no pivot markers in window, using fallback tolerance"
        );
    }

    let levels = cluster_levels(&trading, window_points, limit);
    debug!(
        bars = bars.len(),
        trading = trading.len(),
        markers = window_points.iter().filter(|p| p.position.is_some()).count(),
        levels = levels.len(),
        limit,
        "pivot analysis"
    );

    PivotAnalysis {
        points,
        window: trading[range].to_vec(),
        limit,
        limit_fallback,
        levels,
    }
}
