//! `fiscal-space` library crate.
//!
//! The binary (`fiscal`) is a thin wrapper around this library so that:
//!
//! - the index engine is testable without spawning processes
//! - providers, registries, and renderers are reusable on their own
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod index;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
