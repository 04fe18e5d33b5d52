//! Command-line parsing for the fiscal-space composite index.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! engine and presentation code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DataSource;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fiscal",
    version,
    about = "Fiscal-space composite index (World Bank WDI indicators)"
)]
pub struct Cli {
    /// Log filter (`error`, `warn`, `info`, `debug`, or a tracing directive). `RUST_LOG` wins.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the composite index, print the table, and optionally plot/export.
    Composite(RunArgs),
    /// Show one raw indicator with gaps preserved.
    Indicator(IndicatorArgs),
    /// List configured countries and indicators.
    List(ListArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same engine as `fiscal composite`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(RunArgs),
}

/// Common options for every engine request.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Country codes or names (comma-separated). Defaults to every configured country.
    #[arg(short = 'c', long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// First year (inclusive). Defaults to the lower configured bound.
    #[arg(short = 's', long)]
    pub start: Option<i32>,

    /// Last year (inclusive). Defaults to the upper configured bound.
    #[arg(short = 'e', long)]
    pub end: Option<i32>,

    /// Where indicator values come from.
    #[arg(long, value_enum, default_value_t = DataSource::Worldbank)]
    pub source: DataSource,

    /// Panel CSV for `--source csv` (prompted for when omitted).
    #[arg(long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Seed for `--source synthetic`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability that a synthetic cell is missing.
    #[arg(long, default_value_t = 0.05)]
    pub missing_prob: f64,

    /// Registry JSON (countries, indicators, year bounds) replacing the reference set.
    #[arg(long, value_name = "JSON")]
    pub registry: Option<PathBuf>,

    /// Issue the per-indicator fetches concurrently.
    #[arg(long)]
    pub parallel: bool,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the result table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the result table plus metadata to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Write a markdown debug bundle of every composite stage under `debug/`.
    #[arg(long)]
    pub debug_bundle: bool,
}

/// Options for the individual-indicator view.
#[derive(Debug, Parser, Clone)]
pub struct IndicatorArgs {
    /// Indicator code, e.g. `GC.DOD.TOTL.GD.ZS`.
    pub code: String,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// Registry JSON to list instead of the reference set.
    #[arg(long, value_name = "JSON")]
    pub registry: Option<PathBuf>,
}
