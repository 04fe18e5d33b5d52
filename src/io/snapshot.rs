//! JSON export of a full run: request metadata plus the result table.
//!
//! The schema is `OutputFile`; it is written for downstream tools and never
//! read back by this crate.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::RunOutput;
use crate::domain::{Country, Indicator, SeriesTable, YearRange};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct OutputFile {
    pub tool: String,
    pub generated_at: String,
    /// `composite` or `indicator`.
    pub kind: String,
    pub source: String,
    pub years: YearRange,
    pub countries: Vec<Country>,
    /// Indicators behind the table, in aggregation order.
    pub indicators: Vec<Indicator>,
    pub table: SeriesTable,
}

impl OutputFile {
    pub fn from_run(output: &RunOutput, source: &str) -> Self {
        let (kind, countries, indicators): (&str, Vec<Country>, Vec<Indicator>) = match output {
            RunOutput::Composite(run) => (
                "composite",
                run.countries.clone(),
                run.stages.iter().map(|s| s.indicator.clone()).collect(),
            ),
            RunOutput::Individual(run) => (
                "indicator",
                run.display.series.iter().map(|s| s.country.clone()).collect(),
                vec![run.display.indicator.clone()],
            ),
        };

        Self {
            tool: "fiscal".to_string(),
            generated_at: chrono::Local::now().to_rfc3339(),
            kind: kind.to_string(),
            source: source.to_string(),
            years: *output.selection().years(),
            countries,
            indicators,
            table: output.to_table(),
        }
    }
}

pub fn write_output_json(path: &Path, output: &RunOutput, source: &str) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON export '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &OutputFile::from_run(output, source))
        .map_err(|e| AppError::new(2, format!("Failed to write JSON export: {e}")))?;
    tracing::info!(path = %path.display(), "Wrote JSON export.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::IndicatorRun;
    use crate::domain::{IndicatorPanel, IndicatorSelection, Polarity, Selection};
    use crate::index::format_series;

    #[test]
    fn individual_run_serializes_gaps_as_null() {
        let years = YearRange::new(2000, 2001).unwrap();
        let indicator = Indicator::new("T", "Tax", "% of GDP", "%", Polarity::Positive);
        let countries = vec![Country::new("ARG", "Argentina")];
        let raw = IndicatorPanel::new("T", years, vec!["ARG".into()], vec![vec![Some(10.0), None]]).unwrap();
        let display = format_series(&raw, &indicator, &countries);
        let selection = Selection::new(vec!["ARG".into()], years, IndicatorSelection::Single("T".into())).unwrap();
        let output = RunOutput::Individual(IndicatorRun { selection, raw, display });

        let value = serde_json::to_value(OutputFile::from_run(&output, "synthetic")).unwrap();
        assert_eq!(value["kind"], "indicator");
        assert_eq!(value["years"]["start"], 2000);
        assert_eq!(value["indicators"][0]["polarity"], "positive");
        assert_eq!(value["table"]["gap_policy"], "preserve");
        assert_eq!(value["table"]["series"][0]["values"], serde_json::json!([10.0, null]));
    }
}
