//! Pairwise clustering of pivot markers into support/resistance levels.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::detector::PivotPoint;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    High,
    Low,
}

/// One matched pair of pivots, keyed by the earlier pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrLevel {
    pub timestamp: NaiveDateTime,
    pub level: f64,
    pub kind: LevelKind,
}

/// Matching tolerance: marker range divided by marker count.
///
/// Returns `(fallback, true)` when no point carries a marker.
pub fn tolerance(points: &[PivotPoint], fallback: f64) -> (f64, bool) {
    let mut count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in points.iter().filter_map(|p| p.position) {
        count += 1;
        min = min.min(p);
        max = max.max(p);
    }

    if count == 0 {
        (fallback, true)
    } else {
        ((max - min) / count as f64, false)
    }
}

/// Every ordered pair (i < j) of same-type markers closer than `limit`.
///
/// A marker above its bar's high is High-type, one below its low is Low-type.
/// Pairs are not merged: a level touched by three pivots yields three records.
pub fn cluster_levels(bars: &[Bar], points: &[PivotPoint], limit: f64) -> Vec<SrLevel> {
    let marked: Vec<(&Bar, f64)> = points
        .iter()
        .filter_map(|p| Some((bars.get(p.index)?, p.position?)))
        .collect();

    let mut levels = Vec::new();
    for (i, &(bar_i, pos_i)) in marked.iter().enumerate() {
        for &(bar_j, pos_j) in &marked[i + 1..] {
            let close_enough = (pos_i - pos_j).abs() < limit;
            let kind = if pos_i > bar_i.high && pos_j > bar_j.high && close_enough {
                LevelKind::High
            } else if pos_i < bar_i.low && pos_j < bar_j.low && close_enough {
                LevelKind::Low
            } else {
                continue;
            };
            levels.push(SrLevel {
                timestamp: bar_i.timestamp,
                level: pos_i,
                kind,
            });
        }
    }
    levels
}
