//! Shared domain types.
//!
//! Registries and selections are immutable once built: every request gets a
//! fresh `Selection`, validated against an `EngineConfig` that the caller
//! constructs up front (reference registries or a JSON registry file).

use std::collections::HashSet;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Direction in which an indicator moves fiscal space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Higher raw values mean more fiscal space.
    Positive,
    /// Higher raw values mean less fiscal space (debt stocks, for example).
    Negative,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }
}

/// A configured raw indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    /// Provider series code, e.g. `GC.DOD.TOTL.GD.ZS`.
    pub code: String,
    pub name: String,
    /// Axis label for the individual view.
    #[serde(default)]
    pub unit: String,
    /// Appended to formatted values (`%` for ratios to GDP).
    #[serde(default)]
    pub suffix: String,
    pub polarity: Polarity,
}

impl Indicator {
    pub fn new(code: &str, name: &str, unit: &str, suffix: &str, polarity: Polarity) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            suffix: suffix.to_string(),
            polarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

impl Country {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// Fixed country registry (name ↔ code). Codes are unique, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountryRegistry {
    countries: Vec<Country>,
}

impl CountryRegistry {
    pub fn new(countries: Vec<Country>) -> Result<Self, AppError> {
        if countries.is_empty() {
            return Err(AppError::new(2, "Country registry must not be empty."));
        }
        let mut seen = HashSet::new();
        for country in &countries {
            let code = country.code.trim();
            if code.is_empty() {
                return Err(AppError::new(
                    2,
                    format!("Country '{}' has an empty code.", country.name),
                ));
            }
            if !seen.insert(code.to_ascii_uppercase()) {
                return Err(AppError::new(2, format!("Duplicate country code '{code}'.")));
            }
        }
        Ok(Self { countries })
    }

    /// The five Latin American economies of the reference dashboard.
    pub fn reference() -> Self {
        Self {
            countries: vec![
                Country::new("ARG", "Argentina"),
                Country::new("BRA", "Brazil"),
                Country::new("CHL", "Chile"),
                Country::new("PER", "Peru"),
                Country::new("URY", "Uruguay"),
            ],
        }
    }

    pub fn all(&self) -> &[Country] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&Country> {
        let code = code.trim();
        self.countries.iter().find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// Resolve a user token that is either a code or a display name.
    pub fn resolve(&self, token: &str) -> Result<&Country, AppError> {
        let token = token.trim();
        self.get(token)
            .or_else(|| self.countries.iter().find(|c| c.name.eq_ignore_ascii_case(token)))
            .ok_or_else(|| AppError::new(2, format!("Unknown country '{token}'.")))
    }

    pub fn codes(&self) -> Vec<String> {
        self.countries.iter().map(|c| c.code.clone()).collect()
    }
}

/// Fixed indicator list with polarities. Order is the aggregation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndicatorRegistry {
    indicators: Vec<Indicator>,
}

impl IndicatorRegistry {
    pub fn new(indicators: Vec<Indicator>) -> Result<Self, AppError> {
        if indicators.is_empty() {
            return Err(AppError::new(2, "Indicator registry must not be empty."));
        }
        let mut seen = HashSet::new();
        for ind in &indicators {
            let code = ind.code.trim();
            if code.is_empty() {
                return Err(AppError::new(
                    2,
                    format!("Indicator '{}' has an empty code.", ind.name),
                ));
            }
            if !seen.insert(code.to_ascii_uppercase()) {
                return Err(AppError::new(2, format!("Duplicate indicator code '{code}'.")));
            }
        }
        Ok(Self { indicators })
    }

    /// World Bank WDI series used by the reference composite.
    ///
    /// Government debt and external debt stocks reduce fiscal space.
    pub fn reference() -> Self {
        Self {
            indicators: vec![
                Indicator::new(
                    "GC.DOD.TOTL.GD.ZS",
                    "Central government debt, total",
                    "% of GDP",
                    "%",
                    Polarity::Negative,
                ),
                Indicator::new(
                    "GC.TAX.TOTL.GD.ZS",
                    "Tax revenue",
                    "% of GDP",
                    "%",
                    Polarity::Positive,
                ),
                Indicator::new(
                    "DT.DOD.DECT.CD",
                    "External debt stocks, total",
                    "current US$",
                    "",
                    Polarity::Negative,
                ),
                Indicator::new(
                    "FS.AST.PRVT.GD.ZS",
                    "Domestic credit to private sector",
                    "% of GDP",
                    "%",
                    Polarity::Positive,
                ),
                Indicator::new(
                    "NY.GDP.MKTP.CD",
                    "GDP",
                    "current US$",
                    "",
                    Polarity::Positive,
                ),
            ],
        }
    }

    pub fn all(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&Indicator> {
        let code = code.trim();
        self.indicators.iter().find(|i| i.code.eq_ignore_ascii_case(code))
    }
}

/// Inclusive, contiguous range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::new(
                2,
                format!("Invalid year range: start {start} is after end {end}."),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Always false; a range holds at least one year.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Row index of `year` on this axis.
    pub fn index_of(&self, year: i32) -> Option<usize> {
        self.contains(year).then(|| (year - self.start) as usize)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.start..=self.end
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.years().collect()
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Allowed year window for selections (configuration, not an algorithm constant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    pub const REFERENCE: YearBounds = YearBounds { min: 1990, max: 2024 };

    pub fn check(&self, range: &YearRange) -> Result<(), AppError> {
        if range.start() < self.min || range.end() > self.max {
            return Err(AppError::new(
                2,
                format!(
                    "Year range {range} is outside the configured bounds {}-{}.",
                    self.min, self.max
                ),
            ));
        }
        Ok(())
    }

    pub fn full_range(&self) -> YearRange {
        YearRange {
            start: self.min,
            end: self.max,
        }
    }
}

/// Which output path a request takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorSelection {
    /// All configured indicators, normalized and averaged.
    Composite,
    /// One raw indicator, displayed as-is.
    Single(String),
}

/// A validated user request: non-empty, de-duplicated countries and a year range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    countries: Vec<String>,
    years: YearRange,
    indicator: IndicatorSelection,
}

impl Selection {
    pub fn new(
        countries: Vec<String>,
        years: YearRange,
        indicator: IndicatorSelection,
    ) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        let countries: Vec<String> = countries
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && seen.insert(c.to_ascii_uppercase()))
            .collect();
        if countries.is_empty() {
            return Err(AppError::new(2, "Select at least one country."));
        }
        Ok(Self {
            countries,
            years,
            indicator,
        })
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn years(&self) -> &YearRange {
        &self.years
    }

    pub fn indicator(&self) -> &IndicatorSelection {
        &self.indicator
    }
}

/// Immutable configuration handed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub countries: CountryRegistry,
    pub indicators: IndicatorRegistry,
    pub year_bounds: YearBounds,
}

impl EngineConfig {
    pub fn new(
        countries: CountryRegistry,
        indicators: IndicatorRegistry,
        year_bounds: YearBounds,
    ) -> Result<Self, AppError> {
        if year_bounds.min > year_bounds.max {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid year bounds: {} is after {}.",
                    year_bounds.min, year_bounds.max
                ),
            ));
        }
        Ok(Self {
            countries,
            indicators,
            year_bounds,
        })
    }

    pub fn reference() -> Self {
        Self {
            countries: CountryRegistry::reference(),
            indicators: IndicatorRegistry::reference(),
            year_bounds: YearBounds::REFERENCE,
        }
    }

    /// Resolve the selected country codes to registry entries, in selection order.
    pub fn resolve_countries(&self, selection: &Selection) -> Result<Vec<Country>, AppError> {
        selection
            .countries()
            .iter()
            .map(|code| {
                self.countries
                    .get(code)
                    .cloned()
                    .ok_or_else(|| AppError::new(2, format!("Unknown country code '{code}'.")))
            })
            .collect()
    }

    pub fn indicator(&self, code: &str) -> Result<&Indicator, AppError> {
        self.indicators
            .get(code)
            .ok_or_else(|| AppError::new(2, format!("Unknown indicator '{code}'.")))
    }
}

/// How missing cells are treated by an output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Composite path: missing z-values contribute 0.
    ZeroFill,
    /// Individual path: missing raw values stay visible gaps.
    Preserve,
}

/// How the K per-indicator fetches of the composite path are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Sequential,
    /// Fan out on the rayon pool, join before aggregation.
    Parallel,
}

/// Where raw indicator values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// World Bank v2 API.
    Worldbank,
    /// Deterministic seeded series (offline).
    Synthetic,
    /// Long-format CSV file (`indicator,country,year,value`).
    Csv,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Country codes or names; empty means every registry country.
    pub countries: Vec<String>,
    pub start: Option<i32>,
    pub end: Option<i32>,
    pub indicator: IndicatorSelection,

    pub source: DataSource,
    pub input: Option<PathBuf>,
    pub seed: u64,
    /// Probability that a synthetic cell is missing.
    pub missing_prob: f64,
    pub registry: Option<PathBuf>,
    pub fetch_mode: FetchMode,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
    pub debug_bundle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_range_indexes_inclusive_bounds() {
        let r = YearRange::new(2000, 2003).unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.index_of(2000), Some(0));
        assert_eq!(r.index_of(2003), Some(3));
        assert_eq!(r.index_of(2004), None);
        assert_eq!(r.to_vec(), vec![2000, 2001, 2002, 2003]);
    }

    #[test]
    fn year_range_rejects_inverted_bounds() {
        let err = YearRange::new(2010, 2000).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bounds_reject_out_of_window_ranges() {
        let bounds = YearBounds::REFERENCE;
        assert!(bounds.check(&YearRange::new(1990, 2024).unwrap()).is_ok());
        assert!(bounds.check(&YearRange::new(1989, 2000).unwrap()).is_err());
        assert!(bounds.check(&YearRange::new(2000, 2025).unwrap()).is_err());
    }

    #[test]
    fn selection_requires_a_country() {
        let years = YearRange::new(2000, 2001).unwrap();
        let err = Selection::new(vec![], years, IndicatorSelection::Composite).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = Selection::new(vec!["  ".into()], years, IndicatorSelection::Composite).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn selection_dedups_preserving_order() {
        let years = YearRange::new(2000, 2001).unwrap();
        let sel = Selection::new(
            vec!["BRA".into(), "ARG".into(), "bra".into()],
            years,
            IndicatorSelection::Composite,
        )
        .unwrap();
        assert_eq!(sel.countries(), &["BRA".to_string(), "ARG".to_string()]);
    }

    #[test]
    fn registries_reject_duplicate_codes() {
        let err = CountryRegistry::new(vec![Country::new("ARG", "A"), Country::new("arg", "B")])
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate"));

        let err = IndicatorRegistry::new(vec![
            Indicator::new("X", "x", "", "", Polarity::Positive),
            Indicator::new("X", "x2", "", "", Polarity::Negative),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn country_resolution_accepts_codes_and_names() {
        let reg = CountryRegistry::reference();
        assert_eq!(reg.resolve("chl").unwrap().code, "CHL");
        assert_eq!(reg.resolve("Uruguay").unwrap().code, "URY");
        assert!(reg.resolve("Narnia").is_err());
    }

    #[test]
    fn reference_polarities_match_debt_indicators() {
        let reg = IndicatorRegistry::reference();
        let negatives: Vec<&str> = reg
            .all()
            .iter()
            .filter(|i| i.polarity == Polarity::Negative)
            .map(|i| i.code.as_str())
            .collect();
        assert_eq!(negatives, vec!["GC.DOD.TOTL.GD.ZS", "DT.DOD.DECT.CD"]);
        assert_eq!(Polarity::Negative.sign(), -1.0);
    }
}
