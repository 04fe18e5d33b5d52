//! Composite aggregation of sign-aligned z-score panels.
//!
//! Fill policy (`GapPolicy::ZeroFill`): a missing z-value contributes 0, and
//! the sum is always divided by the configured indicator count K, never by
//! the number of indicators present in a cell.

use nalgebra::DMatrix;

use crate::domain::{CompositePanel, Country, IndicatorPanel};
use crate::error::AppError;

/// Dense copy of a panel with every missing cell replaced by 0.
fn zero_filled(panel: &IndicatorPanel) -> DMatrix<f64> {
    let columns = panel.columns();
    DMatrix::from_fn(panel.years().len(), columns.len(), |row, col| {
        columns[col][row].unwrap_or(0.0)
    })
}

/// Average K aligned panels that share one year axis and country list.
///
/// `countries` supplies display names and must match the panels' columns.
pub fn aggregate(aligned: &[IndicatorPanel], countries: &[Country]) -> Result<CompositePanel, AppError> {
    let Some(first) = aligned.first() else {
        return Err(AppError::new(4, "Composite requires at least one indicator panel."));
    };

    let codes_match = first.countries().len() == countries.len()
        && first
            .countries()
            .iter()
            .zip(countries)
            .all(|(code, country)| code.eq_ignore_ascii_case(&country.code));
    if !codes_match {
        return Err(AppError::new(
            4,
            format!(
                "Composite country list does not match the columns of {}.",
                first.indicator()
            ),
        ));
    }

    if let Some(other) = aligned.iter().find(|p| !p.same_shape(first)) {
        return Err(AppError::new(
            4,
            format!(
                "Panel {} does not share the year axis and countries of {}.",
                other.indicator(),
                first.indicator()
            ),
        ));
    }

    let k = aligned.len() as f64;
    let mut sum = DMatrix::<f64>::zeros(first.years().len(), countries.len());
    for panel in aligned {
        sum += zero_filled(panel);
    }
    let values = sum / k;

    tracing::debug!(
        indicators = aligned.len(),
        years = first.years().len(),
        countries = countries.len(),
        "Aggregated composite."
    );

    Ok(CompositePanel {
        years: *first.years(),
        countries: countries.to_vec(),
        indicators: aligned.iter().map(|p| p.indicator().to_string()).collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YearRange;

    fn countries() -> Vec<Country> {
        vec![Country::new("ARG", "Argentina"), Country::new("BRA", "Brazil")]
    }

    fn panel(code: &str, arg: Vec<Option<f64>>, bra: Vec<Option<f64>>) -> IndicatorPanel {
        IndicatorPanel::new(
            code,
            YearRange::new(2000, 2001).unwrap(),
            vec!["ARG".into(), "BRA".into()],
            vec![arg, bra],
        )
        .unwrap()
    }

    #[test]
    fn hand_computed_two_by_two_by_two() {
        // Indicator A: ARG [1, -1], BRA [0.5, missing]
        // Indicator B: ARG [3, 1],  BRA [missing, missing]
        let a = panel("A", vec![Some(1.0), Some(-1.0)], vec![Some(0.5), None]);
        let b = panel("B", vec![Some(3.0), Some(1.0)], vec![None, None]);

        let c = aggregate(&[a, b], &countries()).unwrap();
        assert!((c.value(2000, "ARG").unwrap() - 2.0).abs() < 1e-12);
        assert!((c.value(2001, "ARG").unwrap() - 0.0).abs() < 1e-12);
        // Missing counts as 0 and K stays 2: (0.5 + 0) / 2.
        assert!((c.value(2000, "BRA").unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(c.value(2001, "BRA"), Some(0.0));
        assert_eq!(c.indicators(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn entirely_missing_country_gets_zero_composite() {
        let a = panel("A", vec![Some(1.0), Some(-1.0)], vec![None, None]);
        let c = aggregate(&[a], &countries()).unwrap();
        assert_eq!(c.series("BRA").unwrap(), vec![0.0, 0.0]);
        assert_eq!(c.series("ARG").unwrap(), vec![1.0, -1.0]);
    }

    #[test]
    fn rejects_empty_and_mismatched_inputs() {
        assert_eq!(aggregate(&[], &countries()).unwrap_err().exit_code(), 4);

        let a = panel("A", vec![None, None], vec![None, None]);
        let shifted = IndicatorPanel::new(
            "B",
            YearRange::new(2001, 2002).unwrap(),
            vec!["ARG".into(), "BRA".into()],
            vec![vec![None, None], vec![None, None]],
        )
        .unwrap();
        let err = aggregate(&[a.clone(), shifted], &countries()).unwrap_err();
        assert!(err.to_string().contains("does not share"));

        let err = aggregate(&[a], &countries()[..1]).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn extreme_finite_inputs_give_a_finite_composite() {
        use crate::domain::Polarity;
        use crate::index::{align, normalize};

        let raw = panel(
            "A",
            vec![Some(1.0e308), Some(1.7e308)],
            vec![Some(-1.7e308), Some(1.7e308)],
        );
        let aligned = align(&normalize(&raw), Polarity::Negative);
        let c = aggregate(&[aligned], &countries()).unwrap();
        assert!(c.values().iter().all(|v| v.is_finite()));
        assert!((c.value(2000, "ARG").unwrap() - 1.0).abs() < 1e-12);
        assert!((c.value(2001, "BRA").unwrap() + 1.0).abs() < 1e-12);
    }
}
