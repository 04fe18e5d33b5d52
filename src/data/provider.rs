//! The indicator data provider seam.
//!
//! Providers return raw observations keyed by country code and a year *label*
//! (`"2001"`, `"YR2001"`, ...). They make no ordering promise; the panel
//! reshaper owns canonicalization and alignment.

use crate::domain::YearRange;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub country: String,
    pub year_label: String,
    pub value: Option<f64>,
}

impl RawObservation {
    pub fn new(country: &str, year_label: &str, value: Option<f64>) -> Self {
        Self {
            country: country.to_string(),
            year_label: year_label.to_string(),
            value,
        }
    }
}

/// Provider output for one indicator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    observations: Vec<RawObservation>,
}

impl RawResponse {
    pub fn new(observations: Vec<RawObservation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[RawObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl FromIterator<RawObservation> for RawResponse {
    fn from_iter<I: IntoIterator<Item = RawObservation>>(iter: I) -> Self {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}

/// Supplies raw values for `(indicator, countries, years)`.
///
/// Implementations must be side-effect free per call so the composite path can
/// issue the K fetches in any order, or in parallel.
pub trait IndicatorProvider: Send + Sync {
    /// Short label for logs and reports.
    fn name(&self) -> &str;

    /// Extra lines for the run summary (input file, skipped rows, ...).
    fn notes(&self) -> Vec<String> {
        Vec::new()
    }

    fn fetch(
        &self,
        indicator: &str,
        countries: &[String],
        years: &YearRange,
    ) -> Result<RawResponse, AppError>;
}

impl<T: IndicatorProvider + ?Sized> IndicatorProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn notes(&self) -> Vec<String> {
        (**self).notes()
    }

    fn fetch(
        &self,
        indicator: &str,
        countries: &[String],
        years: &YearRange,
    ) -> Result<RawResponse, AppError> {
        (**self).fetch(indicator, countries, years)
    }
}

impl<T: IndicatorProvider + ?Sized> IndicatorProvider for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn notes(&self) -> Vec<String> {
        (**self).notes()
    }

    fn fetch(
        &self,
        indicator: &str,
        countries: &[String],
        years: &YearRange,
    ) -> Result<RawResponse, AppError> {
        (**self).fetch(indicator, countries, years)
    }
}
