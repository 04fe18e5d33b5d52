//! Panel reshaping: provider observations -> year × country table.
//!
//! The output year axis is exactly the requested range, ascending; columns are
//! exactly the requested countries, in request order. Anything the provider
//! did not deliver is a missing cell.

use std::collections::HashMap;

use crate::data::RawResponse;
use crate::domain::{IndicatorPanel, YearRange};

/// Canonicalize a provider year label to a plain year.
///
/// Accepts `"2001"` and prefixed labels such as `"YR2001"`. Returns `None` when
/// the label does not end in a digit run after its prefix.
pub fn canonical_year(label: &str) -> Option<i32> {
    let digits = label
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn reshape(
    response: &RawResponse,
    indicator: &str,
    countries: &[String],
    years: &YearRange,
) -> IndicatorPanel {
    let mut columns: Vec<Vec<Option<f64>>> = vec![vec![None; years.len()]; countries.len()];

    let col_of: HashMap<String, usize> = countries
        .iter()
        .enumerate()
        .map(|(idx, code)| (code.trim().to_ascii_uppercase(), idx))
        .collect();

    let mut bad_labels = 0usize;
    let mut out_of_range = 0usize;

    for obs in response.observations() {
        let Some(&col) = col_of.get(&obs.country.trim().to_ascii_uppercase()) else {
            continue;
        };
        let Some(year) = canonical_year(&obs.year_label) else {
            bad_labels += 1;
            continue;
        };
        let Some(row) = years.index_of(year) else {
            out_of_range += 1;
            continue;
        };
        // A later missing duplicate never erases an earlier value.
        if let Some(value) = obs.value.filter(|v| v.is_finite()) {
            columns[col][row] = Some(value);
        }
    }

    if bad_labels > 0 || out_of_range > 0 {
        tracing::debug!(
            indicator,
            bad_labels,
            out_of_range,
            "Skipped provider observations while reshaping."
        );
    }

    let panel = IndicatorPanel::from_axes(indicator, *years, countries.to_vec(), columns);
    tracing::debug!(
        indicator,
        cells = panel.cell_count(),
        missing = panel.missing_count(),
        "Reshaped panel."
    );
    panel
}
