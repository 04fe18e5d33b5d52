//! Read engine configuration (registries + year bounds) from JSON.
//!
//! ```json
//! {
//!   "countries":  [{"code": "ARG", "name": "Argentina"}],
//!   "indicators": [{"code": "GC.DOD.TOTL.GD.ZS", "name": "Debt", "unit": "% of GDP",
//!                   "suffix": "%", "polarity": "negative"}],
//!   "year_bounds": {"min": 1990, "max": 2024}
//! }
//! ```
//!
//! `year_bounds` is optional and defaults to 1990..=2024.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Country, CountryRegistry, EngineConfig, Indicator, IndicatorRegistry, YearBounds};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    countries: Vec<Country>,
    indicators: Vec<Indicator>,
    #[serde(default)]
    year_bounds: Option<YearBounds>,
}

pub fn read_engine_config(path: &Path) -> Result<EngineConfig, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open registry JSON '{}': {e}", path.display()))
    })?;
    let raw: RegistryFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid registry JSON '{}': {e}", path.display())))?;
    engine_config_from(raw)
}

pub fn parse_engine_config(json: &str) -> Result<EngineConfig, AppError> {
    let raw: RegistryFile = serde_json::from_str(json)
        .map_err(|e| AppError::new(2, format!("Invalid registry JSON: {e}")))?;
    engine_config_from(raw)
}

fn engine_config_from(raw: RegistryFile) -> Result<EngineConfig, AppError> {
    EngineConfig::new(
        CountryRegistry::new(raw.countries)?,
        IndicatorRegistry::new(raw.indicators)?,
        raw.year_bounds.unwrap_or(YearBounds::REFERENCE),
    )
}

/// Resolve `--registry`, falling back to the reference configuration.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, AppError> {
    match path {
        Some(path) => {
            let config = read_engine_config(path)?;
            tracing::info!(
                path = %path.display(),
                countries = config.countries.len(),
                indicators = config.indicators.len(),
                "Loaded registry."
            );
            Ok(config)
        }
        None => Ok(EngineConfig::reference()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Polarity;

    #[test]
    fn parses_synthetic_registry() {
        let config = parse_engine_config(
            r#"{
                "countries": [{"code": "X", "name": "Xland"}],
                "indicators": [
                    {"code": "A", "name": "Alpha", "polarity": "positive"},
                    {"code": "B", "name": "Beta", "unit": "%", "suffix": "%", "polarity": "negative"}
                ],
                "year_bounds": {"min": 2000, "max": 2001}
            }"#,
        )
        .unwrap();

        assert_eq!(config.countries.len(), 1);
        assert_eq!(config.indicators.get("b").unwrap().polarity, Polarity::Negative);
        assert_eq!(config.indicators.get("A").unwrap().suffix, "");
        assert_eq!(config.year_bounds, YearBounds { min: 2000, max: 2001 });
    }

    #[test]
    fn defaults_bounds_and_validates_content() {
        let config = parse_engine_config(
            r#"{"countries": [{"code": "X", "name": "X"}],
                "indicators": [{"code": "A", "name": "A", "polarity": "positive"}]}"#,
        )
        .unwrap();
        assert_eq!(config.year_bounds, YearBounds::REFERENCE);

        let err = parse_engine_config(r#"{"countries": [{"code": "X", "name": "X"}], "indicators": []}"#)
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let err = parse_engine_config(
            r#"{"countries": [{"code": "X", "name": "X"}],
                "indicators": [{"code": "A", "name": "A", "polarity": "sideways"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = parse_engine_config(
            r#"{"countries": [{"code": "X", "name": "X"}],
                "indicators": [{"code": "A", "name": "A", "polarity": "positive"}],
                "year_bounds": {"min": 2010, "max": 2000}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid year bounds"));
    }
}
