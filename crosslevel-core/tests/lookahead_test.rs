//! Look-ahead contamination tests for indicators and crossover series.
//!
//! No value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..250). Bars 0..100 must be identical between both runs.

use chrono::NaiveDate;
use crosslevel_core::domain::Bar;
use crosslevel_core::indicators::*;
use crosslevel_core::signals::{ema_crossover_series, pair_series, CrossoverSetup};

/// Generate N bars of synthetic OHLCV data with realistic variation.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05; // -5.0 to +5.0
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000 + (i as u64 * 100),
        });
    }

    bars
}

fn assert_series_prefix_equal(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (&t, &f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated_result = indicator.compute(&full_bars[..truncated_len]);
    let full_result = indicator.compute(full_bars);

    assert_eq!(truncated_result.len(), truncated_len, "{}: length", indicator.name());
    assert_eq!(full_result.len(), full_bars.len(), "{}: length", indicator.name());
    assert_series_prefix_equal(indicator.name(), &truncated_result, &full_result);
}

#[test]
fn sma_no_lookahead() {
    let bars = make_test_bars(250);
    assert_no_lookahead(&Sma::new(20), &bars, 100);
    assert_no_lookahead(&Sma::new(50), &bars, 100);
}

#[test]
fn ema_no_lookahead() {
    let bars = make_test_bars(250);
    for period in [4, 9, 12, 21, 26, 200] {
        assert_no_lookahead(&Ema::new(period), &bars, 100);
    }
}

#[test]
fn rsi_no_lookahead() {
    let bars = make_test_bars(250);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
    assert_no_lookahead(&Rsi::simple(14), &bars, 100);
}

#[test]
fn standard_set_no_lookahead() {
    let bars = make_test_bars(250);
    for indicator in standard_set() {
        assert_no_lookahead(indicator.as_ref(), &bars, 100);
    }
}

#[test]
fn precompute_prefix_is_stable() {
    let bars = make_test_bars(250);
    let set = standard_set();
    let truncated = precompute(&bars[..100], &set);
    let full = precompute(&bars, &set);
    for name in truncated.names() {
        assert_series_prefix_equal(
            name,
            truncated.get_series(name).unwrap(),
            &full.get_series(name).unwrap()[..100],
        );
    }
}

#[test]
fn crossover_events_no_lookahead() {
    let bars = make_test_bars(250);
    for setup in [CrossoverSetup::Pair(9, 21), CrossoverSetup::Triple(4, 9, 18)] {
        let truncated = ema_crossover_series(&bars[..100], setup);
        let full = ema_crossover_series(&bars, setup);
        assert_eq!(truncated[..], full[..100], "{setup:?}");
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let short = ema_of_series(&closes, 12);
    let long = ema_of_series(&closes, 26);
    assert_eq!(
        pair_series(&short[..100], &long[..100])[..],
        pair_series(&short, &long)[..100]
    );
}
