//! Year × country tables produced by each engine stage.
//!
//! Tables are built once and never mutated; every stage returns a new one.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{Country, GapPolicy, Indicator, YearRange};
use crate::error::AppError;

/// One indicator's values, one column per requested country.
///
/// Used for raw, normalized, and sign-aligned stages alike. Missing cells are
/// `None`, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPanel {
    indicator: String,
    years: YearRange,
    countries: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl IndicatorPanel {
    pub fn new(
        indicator: &str,
        years: YearRange,
        countries: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, AppError> {
        if columns.len() != countries.len() {
            return Err(AppError::new(
                4,
                format!(
                    "Panel for {indicator} has {} columns for {} countries.",
                    columns.len(),
                    countries.len()
                ),
            ));
        }
        if let Some((idx, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != years.len()) {
            return Err(AppError::new(
                4,
                format!(
                    "Panel for {indicator}: column {} has {} rows, expected {}.",
                    countries[idx],
                    col.len(),
                    years.len()
                ),
            ));
        }
        Ok(Self {
            indicator: indicator.to_string(),
            years,
            countries,
            columns,
        })
    }

    /// Columns built directly on `years` × `countries` (shape holds by construction).
    pub(crate) fn from_axes(
        indicator: &str,
        years: YearRange,
        countries: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Self {
        debug_assert_eq!(columns.len(), countries.len());
        debug_assert!(columns.iter().all(|c| c.len() == years.len()));
        Self {
            indicator: indicator.to_string(),
            years,
            countries,
            columns,
        }
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn years(&self) -> &YearRange {
        &self.years
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn columns(&self) -> &[Vec<Option<f64>>] {
        &self.columns
    }

    pub fn column(&self, country: &str) -> Option<&[Option<f64>]> {
        self.countries
            .iter()
            .position(|c| c.eq_ignore_ascii_case(country))
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn value(&self, year: i32, country: &str) -> Option<f64> {
        let row = self.years.index_of(year)?;
        self.column(country)?[row]
    }

    pub fn missing_count(&self) -> usize {
        self.columns.iter().flatten().filter(|v| v.is_none()).count()
    }

    pub fn cell_count(&self) -> usize {
        self.columns.len() * self.years.len()
    }

    /// Same year axis and country columns, in the same order.
    pub fn same_shape(&self, other: &IndicatorPanel) -> bool {
        self.years == other.years && self.countries == other.countries
    }

    /// Build a new panel by transforming every column. `f` must keep column length.
    pub fn map_columns<F>(&self, f: F) -> IndicatorPanel
    where
        F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        let columns: Vec<Vec<Option<f64>>> = self.columns.iter().map(|c| f(c)).collect();
        debug_assert!(columns.iter().all(|c| c.len() == self.years.len()));
        IndicatorPanel {
            indicator: self.indicator.clone(),
            years: self.years,
            countries: self.countries.clone(),
            columns,
        }
    }
}

/// Composite fiscal-space score: rows = years, columns = countries.
///
/// Always fully defined (the composite path zero-fills missing z-values).
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePanel {
    pub(crate) years: YearRange,
    pub(crate) countries: Vec<Country>,
    pub(crate) indicators: Vec<String>,
    pub(crate) values: DMatrix<f64>,
}

impl CompositePanel {
    pub fn years(&self) -> &YearRange {
        &self.years
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Indicator codes that were averaged, in aggregation order.
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn value(&self, year: i32, country: &str) -> Option<f64> {
        let row = self.years.index_of(year)?;
        let col = self
            .countries
            .iter()
            .position(|c| c.code.eq_ignore_ascii_case(country))?;
        Some(self.values[(row, col)])
    }

    pub fn series(&self, country: &str) -> Option<Vec<f64>> {
        let col = self
            .countries
            .iter()
            .position(|c| c.code.eq_ignore_ascii_case(country))?;
        Some(self.values.column(col).iter().copied().collect())
    }

    pub fn to_table(&self) -> SeriesTable {
        let series = self
            .countries
            .iter()
            .enumerate()
            .map(|(col, country)| LabeledSeries {
                code: country.code.clone(),
                name: country.name.clone(),
                values: self.values.column(col).iter().map(|&v| Some(v)).collect(),
            })
            .collect();

        SeriesTable {
            title: "Fiscal space - mean z-score".to_string(),
            y_label: "adjusted mean z-score".to_string(),
            suffix: String::new(),
            years: self.years.to_vec(),
            gap_policy: GapPolicy::ZeroFill,
            series,
        }
    }
}

/// One raw indicator per country, gaps preserved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPanel {
    pub indicator: Indicator,
    pub years: YearRange,
    pub series: Vec<DisplaySeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySeries {
    pub country: Country,
    /// `(year, value)` in ascending year order.
    pub points: Vec<(i32, Option<f64>)>,
}

impl DisplaySeries {
    /// Value of the final year, if that cell is present.
    ///
    /// A missing final cell gets no end-of-line annotation.
    pub fn latest(&self) -> Option<(i32, f64)> {
        self.points.last().and_then(|&(year, v)| v.map(|v| (year, v)))
    }
}

impl DisplayPanel {
    pub fn to_table(&self) -> SeriesTable {
        let series = self
            .series
            .iter()
            .map(|s| LabeledSeries {
                code: s.country.code.clone(),
                name: s.country.name.clone(),
                values: s.points.iter().map(|&(_, v)| v).collect(),
            })
            .collect();

        SeriesTable {
            title: self.indicator.name.clone(),
            y_label: self.indicator.unit.clone(),
            suffix: self.indicator.suffix.clone(),
            years: self.years.to_vec(),
            gap_policy: GapPolicy::Preserve,
            series,
        }
    }
}

/// Renderer-facing view shared by both output paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesTable {
    pub title: String,
    pub y_label: String,
    pub suffix: String,
    pub years: Vec<i32>,
    pub gap_policy: GapPolicy,
    pub series: Vec<LabeledSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub code: String,
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl SeriesTable {
    /// Min/max over present values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in self.series.iter().flat_map(|s| s.values.iter().flatten()) {
            min = min.min(*v);
            max = max.max(*v);
        }
        (min.is_finite() && max.is_finite()).then_some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years() -> YearRange {
        YearRange::new(2000, 2002).unwrap()
    }

    #[test]
    fn new_rejects_ragged_columns() {
        let err = IndicatorPanel::new(
            "X",
            years(),
            vec!["ARG".into()],
            vec![vec![Some(1.0), None]],
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 4);

        let err = IndicatorPanel::new("X", years(), vec!["ARG".into(), "BRA".into()], vec![vec![None; 3]])
            .unwrap_err();
        assert!(err.to_string().contains("columns"));
    }

    #[test]
    fn value_lookup_by_year_and_country() {
        let panel = IndicatorPanel::new(
            "X",
            years(),
            vec!["ARG".into(), "BRA".into()],
            vec![vec![Some(1.0), None, Some(3.0)], vec![None; 3]],
        )
        .unwrap();
        assert_eq!(panel.value(2002, "arg"), Some(3.0));
        assert_eq!(panel.value(2001, "ARG"), None);
        assert_eq!(panel.value(1999, "ARG"), None);
        assert_eq!(panel.missing_count(), 4);
        assert_eq!(panel.cell_count(), 6);
    }

    #[test]
    fn display_latest_skips_missing_final_year() {
        let s = DisplaySeries {
            country: Country::new("ARG", "Argentina"),
            points: vec![(2000, Some(1.0)), (2001, None)],
        };
        assert_eq!(s.latest(), None);

        let s = DisplaySeries {
            country: Country::new("ARG", "Argentina"),
            points: vec![(2000, None), (2001, Some(2.5))],
        };
        assert_eq!(s.latest(), Some((2001, 2.5)));
    }

    #[test]
    fn table_value_range_ignores_gaps() {
        let table = SeriesTable {
            title: String::new(),
            y_label: String::new(),
            suffix: String::new(),
            years: vec![2000, 2001],
            gap_policy: GapPolicy::Preserve,
            series: vec![LabeledSeries {
                code: "ARG".into(),
                name: "Argentina".into(),
                values: vec![None, Some(-2.0)],
            }],
        };
        assert_eq!(table.value_range(), Some((-2.0, -2.0)));
    }
}
