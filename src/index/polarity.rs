//! Sign alignment: after this stage, higher always means more fiscal space.

use crate::domain::{IndicatorPanel, Polarity};

pub fn align(panel: &IndicatorPanel, polarity: Polarity) -> IndicatorPanel {
    match polarity {
        Polarity::Positive => panel.clone(),
        Polarity::Negative => panel.map_columns(|col| col.iter().map(|v| v.map(negate)).collect()),
    }
}

/// Negation that keeps a zero z-score at `+0.0`.
fn negate(x: f64) -> f64 {
    if x == 0.0 { 0.0 } else { -x }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YearRange;

    fn panel() -> IndicatorPanel {
        IndicatorPanel::new(
            "X",
            YearRange::new(2000, 2002).unwrap(),
            vec!["ARG".into()],
            vec![vec![Some(-1.5), None, Some(2.0)]],
        )
        .unwrap()
    }

    #[test]
    fn positive_is_identity() {
        assert_eq!(align(&panel(), Polarity::Positive), panel());
    }

    #[test]
    fn negative_negates_every_present_value() {
        let aligned = align(&panel(), Polarity::Negative);
        assert_eq!(aligned.column("ARG").unwrap(), &[Some(1.5), None, Some(-2.0)]);
        assert_eq!(align(&aligned, Polarity::Negative), panel());
    }

    #[test]
    fn negated_zero_stays_positive_zero() {
        let flat = IndicatorPanel::new(
            "X",
            YearRange::new(2000, 2000).unwrap(),
            vec!["ARG".into()],
            vec![vec![Some(0.0)]],
        )
        .unwrap();
        let v = align(&flat, Polarity::Negative).value(2000, "ARG").unwrap();
        assert!(v.is_sign_positive());
    }
}
