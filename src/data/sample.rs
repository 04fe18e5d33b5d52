//! Deterministic synthetic indicator series for offline runs.
//!
//! Each (indicator, country) pair gets its own seeded random walk, so a value
//! never depends on which other countries or years were requested. Rows come
//! back shuffled with `YR`-prefixed year labels, like a real provider.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::{IndicatorProvider, RawObservation, RawResponse};
use crate::domain::YearRange;
use crate::error::AppError;

/// First year of every generated walk; requested years index into it.
const WALK_ORIGIN: i32 = 1960;
/// Step size relative to the series' base level.
const STEP_REL_SIGMA: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    missing_prob: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64, missing_prob: f64) -> Result<Self, AppError> {
        if !(missing_prob.is_finite() && (0.0..1.0).contains(&missing_prob)) {
            return Err(AppError::new(
                2,
                format!("Missing-cell probability must be in [0, 1), got {missing_prob}."),
            ));
        }
        Ok(Self { seed, missing_prob })
    }

    fn series(&self, indicator: &str, country: &str, last_year: i32) -> Result<Vec<Option<f64>>, AppError> {
        let mut rng = StdRng::seed_from_u64(series_seed(self.seed, indicator, country));
        let base = rng.gen_range(5.0..120.0);
        let step = Normal::new(0.0, base * STEP_REL_SIGMA)
            .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

        let len = (last_year - WALK_ORIGIN + 1).max(0) as usize;
        let mut level: f64 = base;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            level = (level + step.sample(&mut rng)).max(0.0);
            let missing = rng.gen_bool(self.missing_prob);
            out.push((!missing).then_some(level));
        }
        Ok(out)
    }
}

impl IndicatorProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        indicator: &str,
        countries: &[String],
        years: &YearRange,
    ) -> Result<RawResponse, AppError> {
        let mut rows = Vec::with_capacity(countries.len() * years.len());
        for country in countries {
            let walk = self.series(indicator, country, years.end())?;
            for year in years.years().filter(|&y| y >= WALK_ORIGIN) {
                let value = walk[(year - WALK_ORIGIN) as usize];
                rows.push(RawObservation {
                    country: country.clone(),
                    year_label: format!("YR{year}"),
                    value,
                });
            }
        }

        let mut rng = StdRng::seed_from_u64(series_seed(self.seed, indicator, "shuffle"));
        rows.shuffle(&mut rng);
        Ok(RawResponse::new(rows))
    }
}

fn series_seed(seed: u64, indicator: &str, country: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    indicator.hash(&mut hasher);
    country.to_ascii_uppercase().hash(&mut hasher);
    hasher.finish()
}
