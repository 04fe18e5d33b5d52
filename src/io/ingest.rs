//! Long-format panel CSV ingest.
//!
//! Turns a file of `indicator,country,year,value` rows into an in-memory
//! provider. Design goals:
//!
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No reshaping here**: year labels are kept verbatim for the reshaper
//!
//! Header aliases follow common export layouts: `economy` for `country`,
//! `time` or `date` for `year`. An empty value (or `..`) is a missing cell.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::data::{IndicatorProvider, RawObservation, RawResponse};
use crate::domain::YearRange;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
struct PanelRow {
    indicator: String,
    observation: RawObservation,
}

/// Provider backed by a panel CSV loaded once at startup.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
    rows: Vec<PanelRow>,
    row_errors: Vec<RowError>,
    rows_read: usize,
}

impl CsvProvider {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
            .clone();
        let columns = Columns::resolve(&headers)?;

        let mut rows = Vec::new();
        let mut row_errors = Vec::new();
        let mut rows_read = 0usize;

        for (idx, result) in reader.records().enumerate() {
            // +2: header is line 1, records are 1-based.
            let line = idx + 2;
            rows_read += 1;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    row_errors.push(RowError {
                        line,
                        message: format!("CSV parse error: {e}"),
                    });
                    continue;
                }
            };

            match parse_row(&record, &columns) {
                Ok(row) => rows.push(row),
                Err(message) => row_errors.push(RowError { line, message }),
            }
        }

        if rows.is_empty() {
            return Err(AppError::new(
                3,
                format!("No valid rows in panel CSV '{}'.", path.display()),
            ));
        }
        if !row_errors.is_empty() {
            tracing::warn!(
                path = %path.display(),
                skipped = row_errors.len(),
                first_line = row_errors[0].line,
                first_error = %row_errors[0].message,
                "Skipped invalid panel CSV rows."
            );
        }
        tracing::info!(path = %path.display(), rows = rows.len(), "Loaded panel CSV.");

        Ok(Self {
            path: path.to_path_buf(),
            rows,
            row_errors,
            rows_read,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }
}

impl IndicatorProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn notes(&self) -> Vec<String> {
        let mut notes = vec![format!(
            "Input: {} ({} of {} rows used)",
            self.path().display(),
            self.rows_used(),
            self.rows_read
        )];
        if let Some(first) = self.row_errors.first() {
            notes.push(format!(
                "Skipped rows: {} (first at line {}: {})",
                self.row_errors.len(),
                first.line,
                first.message
            ));
        }
        notes
    }

    fn fetch(
        &self,
        indicator: &str,
        countries: &[String],
        _years: &YearRange,
    ) -> Result<RawResponse, AppError> {
        let response: RawResponse = self
            .rows
            .iter()
            .filter(|r| r.indicator.eq_ignore_ascii_case(indicator))
            .filter(|r| {
                countries
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&r.observation.country))
            })
            .map(|r| r.observation.clone())
            .collect();

        if response.is_empty() {
            tracing::warn!(indicator, path = %self.path.display(), "No CSV rows for indicator.");
        }
        Ok(response)
    }
}

/// Column positions of the required fields.
struct Columns {
    indicator: usize,
    country: usize,
    year: usize,
    value: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, AppError> {
        let map = build_header_map(headers);
        let find = |names: &[&str]| names.iter().find_map(|n| map.get(*n).copied());

        let missing = |name: &str| {
            AppError::new(
                2,
                format!("Panel CSV is missing the required '{name}' column."),
            )
        };

        Ok(Self {
            indicator: find(&["indicator", "series"]).ok_or_else(|| missing("indicator"))?,
            country: find(&["country", "economy"]).ok_or_else(|| missing("country"))?,
            year: find(&["year", "time", "date"]).ok_or_else(|| missing("year"))?,
            value: find(&["value"]).ok_or_else(|| missing("value"))?,
        })
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    match record.get(idx) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(format!("missing {name}")),
    }
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<PanelRow, String> {
    let indicator = get_required(record, columns.indicator, "indicator")?;
    let country = get_required(record, columns.country, "country")?;
    let year = get_required(record, columns.year, "year")?;
    let value = parse_value(record.get(columns.value).unwrap_or(""))?;

    Ok(PanelRow {
        indicator: indicator.to_string(),
        observation: RawObservation::new(country, year, value),
    })
}

fn parse_value(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ".." || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let v = trimmed
        .parse::<f64>()
        .map_err(|_| format!("invalid value '{trimmed}'"))?;
    if v.is_finite() {
        Ok(Some(v))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fiscal_ingest_{name}_{}.csv", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_rows_with_aliases_and_gaps() {
        let path = write_temp(
            "aliases",
            "Indicator,Economy,Time,Value\n\
             GC.TAX.TOTL.GD.ZS,ARG,YR2000,10\n\
             GC.TAX.TOTL.GD.ZS,ARG,YR2001,\n\
             GC.TAX.TOTL.GD.ZS,BRA,2000,..\n\
             NY.GDP.MKTP.CD,ARG,2000,1e12\n",
        );
        let provider = CsvProvider::load(&path).unwrap();
        assert_eq!(provider.rows_used(), 4);
        assert!(provider.row_errors().is_empty());
        assert_eq!(provider.notes().len(), 1);

        let years = YearRange::new(2000, 2001).unwrap();
        let resp = provider
            .fetch("gc.tax.totl.gd.zs", &["ARG".to_string()], &years)
            .unwrap();
        assert_eq!(
            resp.observations(),
            &[
                RawObservation::new("ARG", "YR2000", Some(10.0)),
                RawObservation::new("ARG", "YR2001", None),
            ]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let path = write_temp(
            "bad_rows",
            "indicator,country,year,value\n\
             X,ARG,2000,abc\n\
             X,,2000,1\n\
             X,ARG,2001,2\n",
        );
        let provider = CsvProvider::load(&path).unwrap();
        assert_eq!(provider.rows_read(), 3);
        assert_eq!(provider.rows_used(), 1);
        assert_eq!(provider.row_errors().len(), 2);
        assert_eq!(provider.row_errors()[0].line, 2);

        let notes = provider.notes();
        assert!(notes[0].ends_with("(1 of 3 rows used)"), "{notes:?}");
        assert!(notes[1].starts_with("Skipped rows: 2 (first at line 2:"), "{notes:?}");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_required_column_is_a_usage_error() {
        let path = write_temp("no_value", "indicator,country,year\nX,ARG,2000\n");
        let err = CsvProvider::load(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("value"));

        let _ = std::fs::remove_file(&path);
    }
}
