//! Individual-indicator formatting for direct display.
//!
//! Gap policy `GapPolicy::Preserve`: raw values pass through untouched and a
//! missing cell stays missing, so charts show a break instead of a zero.

use crate::domain::{Country, DisplayPanel, DisplaySeries, Indicator, IndicatorPanel};

pub fn format_series(panel: &IndicatorPanel, indicator: &Indicator, countries: &[Country]) -> DisplayPanel {
    let years = *panel.years();
    let series = countries
        .iter()
        .map(|country| {
            let points = match panel.column(&country.code) {
                Some(col) => years.years().zip(col.iter().copied()).collect(),
                None => years.years().map(|y| (y, None)).collect(),
            };
            DisplaySeries {
                country: country.clone(),
                points,
            }
        })
        .collect();

    DisplayPanel {
        indicator: indicator.clone(),
        years,
        series,
    }
}
