//! Engine error types.
//!
//! Warm-up shortfalls, oversized pivot windows and empty tolerance sets are
//! recoverable: the engine reports them as absent values (`NaN`, `None`, empty
//! vectors) instead of failing. `EngineError` exists for callers that want to
//! check up front before consuming those results.

use thiserror::Error;

use crate::domain::{validate_series, Bar, BarError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("insufficient data: {required} bars required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error(transparent)]
    Bars(#[from] BarError),
}

/// Validate the series and require at least `required` bars.
pub fn require_history(bars: &[Bar], required: usize) -> Result<(), EngineError> {
    validate_series(bars)?;
    if bars.len() < required {
        return Err(EngineError::InsufficientData {
            required,
            available: bars.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn empty_series_is_a_bar_error() {
        assert_eq!(
            require_history(&[], 1),
            Err(EngineError::Bars(BarError::Empty))
        );
    }

    #[test]
    fn short_series_reports_counts() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert_eq!(
            require_history(&bars, 200),
            Err(EngineError::InsufficientData {
                required: 200,
                available: 3
            })
        );
    }

    #[test]
    fn enough_history_passes() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert!(require_history(&bars, 3).is_ok());
    }
}
