//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration registries (`CountryRegistry`, `IndicatorRegistry`, `EngineConfig`)
//! - request types (`YearRange`, `Selection`, `RunConfig`)
//! - stage tables (`IndicatorPanel`, `CompositePanel`, `DisplayPanel`, `SeriesTable`)

pub mod panel;
pub mod types;

pub use panel::*;
pub use types::*;
