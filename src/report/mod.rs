//! Reporting utilities: data coverage diagnostics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::app::pipeline::IndicatorStage;
use crate::domain::{IndicatorPanel, Polarity};
use crate::math::column_stats;

/// How much of one indicator's panel was actually observed.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorCoverage {
    pub code: String,
    pub name: String,
    pub polarity: Option<Polarity>,
    pub observed: usize,
    pub cells: usize,
    /// Countries with no observation at all (zero-filled in the composite).
    pub empty: Vec<String>,
    /// Countries whose series is constant or a single point (normalized to 0).
    pub degenerate: Vec<String>,
}

impl IndicatorCoverage {
    pub fn share(&self) -> f64 {
        if self.cells == 0 {
            0.0
        } else {
            self.observed as f64 / self.cells as f64
        }
    }
}

/// Coverage of a raw panel.
pub fn panel_coverage(panel: &IndicatorPanel, name: &str, polarity: Option<Polarity>) -> IndicatorCoverage {
    let mut empty = Vec::new();
    let mut degenerate = Vec::new();
    for (code, column) in panel.countries().iter().zip(panel.columns()) {
        match column_stats(column) {
            None => empty.push(code.clone()),
            Some(stats) if stats.is_degenerate() => degenerate.push(code.clone()),
            Some(_) => {}
        }
    }

    IndicatorCoverage {
        code: panel.indicator().to_string(),
        name: name.to_string(),
        polarity,
        observed: panel.cell_count() - panel.missing_count(),
        cells: panel.cell_count(),
        empty,
        degenerate,
    }
}

/// Coverage of every composite stage, in aggregation order.
pub fn stage_coverage(stages: &[IndicatorStage]) -> Vec<IndicatorCoverage> {
    stages
        .iter()
        .map(|s| panel_coverage(&s.raw, &s.indicator.name, Some(s.indicator.polarity)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YearRange;

    #[test]
    fn classifies_empty_and_degenerate_columns() {
        let panel = IndicatorPanel::new(
            "X",
            YearRange::new(2000, 2002).unwrap(),
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec![Some(1.0), Some(2.0), None],
                vec![None, Some(5.0), None],
                vec![None, None, None],
            ],
        )
        .unwrap();

        let cov = panel_coverage(&panel, "Ex", None);
        assert_eq!(cov.observed, 3);
        assert_eq!(cov.cells, 9);
        assert_eq!(cov.empty, vec!["C".to_string()]);
        assert_eq!(cov.degenerate, vec!["B".to_string()]);
        assert!((cov.share() - 1.0 / 3.0).abs() < 1e-12);
    }
}
