//! Market-timing signals derived from indicator series.
//!
//! Signals depend on bar history only. Each one is a pure function of the
//! bars (or of precomputed series) up to and including the latest bar.

pub mod composite;
pub mod crossover;
pub mod trend;
pub mod verdict;
pub mod window;

pub use composite::{composite_score, score_from_values, CompositeBreakdown};
pub use crossover::{detect_pair, detect_triple, pair_series, tail, triple_series, CrossoverEvent};
pub use trend::{classify_trend, ema_trend, Trend};
pub use verdict::{
    ema_crossover_series, ema_crossovers, evaluate_recent, CrossoverSetup, CrossoverVerdict,
    DEFAULT_RECENT_BARS,
};
pub use window::{
    classify_window, ema_signal, evaluate_semaphores, Semaphore, SemaphoreReading, Signal,
};
