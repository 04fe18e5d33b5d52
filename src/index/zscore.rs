//! Per-country time-series standardization.
//!
//! Each country column is standardized against its own mean and population
//! standard deviation over the selected years. Missing cells stay missing so
//! the composite path can apply its own fill policy later.

use crate::domain::IndicatorPanel;
use crate::math::column_stats;

/// Z-score one column.
///
/// - degenerate column (constant or single observation): all zeros
/// - column with no observations: unchanged (all missing)
pub fn zscore_column(column: &[Option<f64>]) -> Vec<Option<f64>> {
    let Some(stats) = column_stats(column) else {
        return column.to_vec();
    };
    if stats.is_degenerate() {
        return vec![Some(0.0); column.len()];
    }
    column
        .iter()
        .map(|v| v.map(|x| stats.standardize(x)))
        .collect()
}

pub fn normalize(panel: &IndicatorPanel) -> IndicatorPanel {
    let degenerate: Vec<&str> = panel
        .countries()
        .iter()
        .zip(panel.columns())
        .filter(|(_, col)| column_stats(col).is_some_and(|s| s.is_degenerate()))
        .map(|(code, _)| code.as_str())
        .collect();
    if !degenerate.is_empty() {
        tracing::debug!(
            indicator = panel.indicator(),
            countries = ?degenerate,
            "No variation over the selected years; normalized to zero."
        );
    }

    panel.map_columns(zscore_column)
}
