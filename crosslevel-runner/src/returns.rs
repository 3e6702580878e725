//! Month-over-month close returns laid out as a year × month grid.
//!
//! A month's close is the last close at or before its final day, so a month
//! without bars carries the previous close forward and reports a 0 return.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crosslevel_core::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    /// 1-based.
    pub month: u32,
    /// Fractional change from the previous month's close. Absent for the first
    /// month of the series and for months outside it.
    #[serde(rename = "return")]
    pub ret: Option<f64>,
}

/// One close per calendar month from the first bar's month to the last's.
fn month_closes(bars: &[Bar]) -> Vec<((i32, u32), f64)> {
    let mut closes: Vec<((i32, u32), f64)> = Vec::new();
    for bar in bars {
        let date = bar.timestamp.date();
        let ym = (date.year(), date.month());
        if let Some((prev_ym, prev_close)) = closes.last().copied() {
            if prev_ym == ym {
                if let Some(last) = closes.last_mut() {
                    last.1 = bar.close;
                }
                continue;
            }
            // Forward-fill empty months between the last bar and this one.
            let mut gap = next_month(prev_ym);
            while gap < ym {
                closes.push((gap, prev_close));
                gap = next_month(gap);
            }
        }
        closes.push((ym, bar.close));
    }
    closes
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Full January..December rows for every year the series touches.
///
/// Bars must be in ascending order. An empty series yields an empty grid.
pub fn monthly_returns(bars: &[Bar]) -> Vec<MonthlyReturn> {
    let closes = month_closes(bars);
    let (Some(first), Some(last)) = (closes.first(), closes.last()) else {
        return Vec::new();
    };
    let (first_year, last_year) = (first.0 .0, last.0 .0);

    let mut grid: Vec<MonthlyReturn> = (first_year..=last_year)
        .flat_map(|year| (1..=12).map(move |month| MonthlyReturn { year, month, ret: None }))
        .collect();

    for pair in closes.windows(2) {
        let ((year, month), close) = pair[1];
        let prev = pair[0].1;
        if prev == 0.0 {
            continue;
        }
        let slot = (year - first_year) as usize * 12 + (month - 1) as usize;
        grid[slot].ret = Some(close / prev - 1.0);
    }
    grid
}
