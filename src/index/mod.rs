//! Composite index engine stages.
//!
//! Responsibilities:
//!
//! - reshape provider observations onto the requested year × country axes
//! - standardize each country's series per indicator
//! - align signs by indicator polarity
//! - average aligned panels into the composite (zero-fill policy)
//! - format one raw indicator for display (gap-preserving policy)

pub mod composite;
pub mod display;
pub mod polarity;
pub mod reshape;
pub mod zscore;

pub use composite::aggregate;
pub use display::format_series;
pub use polarity::align;
pub use reshape::{canonical_year, reshape};
pub use zscore::{normalize, zscore_column};
