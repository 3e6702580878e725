//! Domain types for Crosslevel

pub mod bar;

pub use bar::{closes, validate_series, Bar, BarError};

/// Instrument identifier (ticker).
pub type Instrument = String;
