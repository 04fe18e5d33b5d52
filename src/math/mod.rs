//! Mathematical utilities: missing-aware descriptive statistics.

pub mod stats;

pub use stats::*;
