//! Crosslevel Core: bars, indicators, crossover signals, pivots and the strategy state machine.
//!
//! This crate is the pure, single-threaded analysis engine:
//! - Domain types (bars) and series validation
//! - Indicators (SMA, EMA, RSI) with causal, NaN-padded output
//! - Crossover detection, windowed semaphores, composite score, trend
//! - Pivot detection and pairwise support/resistance clustering
//! - Flat/Long strategy state machine with fixed TP/SL targets
//!
//! Nothing here performs I/O. Bar sources, caching and reporting live in
//! `crosslevel-runner`.

pub mod domain;
pub mod error;
pub mod indicators;
pub mod pivots;
pub mod signals;
pub mod strategy;

pub use error::{require_history, EngineError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine types can cross thread boundaries.
    ///
    /// The runner fans independent instruments out over a thread pool, so
    /// every result type must be `Send + Sync`.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<indicators::IndicatorValues>();
        require_sync::<indicators::IndicatorValues>();
        require_send::<Box<dyn indicators::Indicator>>();
        require_sync::<Box<dyn indicators::Indicator>>();

        require_send::<signals::CompositeBreakdown>();
        require_sync::<signals::CompositeBreakdown>();
        require_send::<signals::SemaphoreReading>();
        require_sync::<signals::SemaphoreReading>();
        require_send::<signals::CrossoverSetup>();
        require_sync::<signals::CrossoverSetup>();

        require_send::<pivots::PivotAnalysis>();
        require_sync::<pivots::PivotAnalysis>();
        require_send::<pivots::PivotConfig>();
        require_sync::<pivots::PivotConfig>();

        require_send::<strategy::StrategyMachine>();
        require_send::<strategy::StrategyRun>();
        require_sync::<strategy::StrategyRun>();
    }

    /// Architecture contract: indicators see bars only.
    ///
    /// `compute()` takes `&[Bar]` and nothing else, so an indicator cannot
    /// read strategy state or another instrument's data.
    #[test]
    fn indicator_trait_takes_bars_only() {
        fn _check_trait_object_builds(ind: &dyn indicators::Indicator, bars: &[domain::Bar]) -> Vec<f64> {
            ind.compute(bars)
        }
    }
}
