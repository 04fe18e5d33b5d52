//! Shared engine workflow used by both CLI and TUI front-ends.
//!
//! Composite path:
//! fetch (K indicators) -> reshape -> z-score -> sign-align -> aggregate
//!
//! Individual path:
//! fetch (1 indicator) -> reshape -> format (gaps preserved)
//!
//! The CLI and the TUI then focus on presentation (printing vs widgets).

use rayon::prelude::*;

use crate::data::{IndicatorProvider, RawResponse};
use crate::domain::{
    CompositePanel, Country, DisplayPanel, EngineConfig, FetchMode, Indicator, IndicatorPanel,
    IndicatorSelection, SeriesTable, Selection,
};
use crate::error::AppError;
use crate::index;

/// Every intermediate panel for one indicator of the composite.
#[derive(Debug, Clone)]
pub struct IndicatorStage {
    pub indicator: Indicator,
    pub raw: IndicatorPanel,
    pub normalized: IndicatorPanel,
    pub aligned: IndicatorPanel,
}

#[derive(Debug, Clone)]
pub struct CompositeRun {
    pub selection: Selection,
    pub countries: Vec<Country>,
    pub stages: Vec<IndicatorStage>,
    pub composite: CompositePanel,
}

#[derive(Debug, Clone)]
pub struct IndicatorRun {
    pub selection: Selection,
    pub raw: IndicatorPanel,
    pub display: DisplayPanel,
}

/// All computed outputs of a single request.
#[derive(Debug, Clone)]
pub enum RunOutput {
    Composite(CompositeRun),
    Individual(IndicatorRun),
}

impl RunOutput {
    pub fn selection(&self) -> &Selection {
        match self {
            RunOutput::Composite(run) => &run.selection,
            RunOutput::Individual(run) => &run.selection,
        }
    }

    pub fn to_table(&self) -> SeriesTable {
        match self {
            RunOutput::Composite(run) => run.composite.to_table(),
            RunOutput::Individual(run) => run.display.to_table(),
        }
    }
}

/// The composite index engine: immutable configuration plus one provider.
///
/// Requests are independent; nothing is cached between calls.
pub struct Engine<P: IndicatorProvider> {
    config: EngineConfig,
    provider: P,
    fetch_mode: FetchMode,
}

impl<P: IndicatorProvider> Engine<P> {
    pub fn new(config: EngineConfig, provider: P) -> Self {
        Self {
            config,
            provider,
            fetch_mode: FetchMode::default(),
        }
    }

    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Dispatch on the selection's indicator choice.
    pub fn run(&self, selection: &Selection) -> Result<RunOutput, AppError> {
        match selection.indicator() {
            IndicatorSelection::Composite => self.composite(selection).map(RunOutput::Composite),
            IndicatorSelection::Single(code) => {
                self.individual(selection, code).map(RunOutput::Individual)
            }
        }
    }

    /// Build the composite fiscal-space index over every configured indicator.
    ///
    /// Any fetch failure aborts the whole request; no partial composite is returned.
    pub fn composite(&self, selection: &Selection) -> Result<CompositeRun, AppError> {
        let countries = self.check_selection(selection)?;
        let codes: Vec<String> = countries.iter().map(|c| c.code.clone()).collect();
        let indicators = self.config.indicators.all();

        tracing::info!(
            indicators = indicators.len(),
            countries = codes.len(),
            years = %selection.years(),
            mode = ?self.fetch_mode,
            "Building composite index."
        );

        let responses = self.fetch_all(indicators, &codes, selection)?;

        let stages: Vec<IndicatorStage> = indicators
            .iter()
            .zip(responses)
            .map(|(indicator, response)| {
                let raw = index::reshape(&response, &indicator.code, &codes, selection.years());
                let normalized = index::normalize(&raw);
                let aligned = index::align(&normalized, indicator.polarity);
                tracing::debug!(
                    indicator = %indicator.code,
                    missing = raw.missing_count(),
                    cells = raw.cell_count(),
                    "Indicator stage complete."
                );
                IndicatorStage {
                    indicator: indicator.clone(),
                    raw,
                    normalized,
                    aligned,
                }
            })
            .collect();

        let aligned: Vec<IndicatorPanel> = stages.iter().map(|s| s.aligned.clone()).collect();
        let composite = index::aggregate(&aligned, &countries)?;

        Ok(CompositeRun {
            selection: selection.clone(),
            countries,
            stages,
            composite,
        })
    }

    /// Fetch and format one raw indicator; no normalization, gaps kept.
    pub fn individual(&self, selection: &Selection, code: &str) -> Result<IndicatorRun, AppError> {
        let countries = self.check_selection(selection)?;
        let indicator = self.config.indicator(code)?.clone();
        let codes: Vec<String> = countries.iter().map(|c| c.code.clone()).collect();

        tracing::info!(
            indicator = %indicator.code,
            countries = codes.len(),
            years = %selection.years(),
            "Fetching individual indicator."
        );

        let response = self.fetch_one(&indicator.code, &codes, selection)?;
        let raw = index::reshape(&response, &indicator.code, &codes, selection.years());
        let display = index::format_series(&raw, &indicator, &countries);

        Ok(IndicatorRun {
            selection: selection.clone(),
            raw,
            display,
        })
    }

    fn check_selection(&self, selection: &Selection) -> Result<Vec<Country>, AppError> {
        self.config.year_bounds.check(selection.years())?;
        self.config.resolve_countries(selection)
    }

    fn fetch_one(
        &self,
        code: &str,
        countries: &[String],
        selection: &Selection,
    ) -> Result<RawResponse, AppError> {
        self.provider
            .fetch(code, countries, selection.years())
            .map_err(|err| {
                tracing::warn!(indicator = code, error = %err, "Indicator fetch failed.");
                AppError::data_unavailable(code, err)
            })
    }

    /// One response per indicator, in configured order.
    ///
    /// In parallel mode the first failure in configured order is reported.
    fn fetch_all(
        &self,
        indicators: &[Indicator],
        countries: &[String],
        selection: &Selection,
    ) -> Result<Vec<RawResponse>, AppError> {
        match self.fetch_mode {
            FetchMode::Sequential => indicators
                .iter()
                .map(|ind| self.fetch_one(&ind.code, countries, selection))
                .collect(),
            FetchMode::Parallel => {
                let results: Vec<Result<RawResponse, AppError>> = indicators
                    .par_iter()
                    .map(|ind| self.fetch_one(&ind.code, countries, selection))
                    .collect();
                results.into_iter().collect()
            }
        }
    }
}
