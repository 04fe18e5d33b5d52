//! Descriptive statistics over series with missing cells.
//!
//! Standardization uses the **population** standard deviation (divisor `n`):
//! a two-point series `[10, 20]` standardizes to exactly `[-1, 1]`.

/// Summary of the present values in one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Every present value is identical (includes single observations).
    pub constant: bool,
    /// Power of two the moments were computed under; keeps sums of values
    /// near `f64::MAX` finite.
    scale: f64,
}

impl ColumnStats {
    /// No discriminating variation: the z-score is defined as 0.
    pub fn is_degenerate(&self) -> bool {
        self.constant || self.std_dev == 0.0
    }

    /// `(x - mean) / std_dev`, evaluated in scaled units so the difference
    /// cannot overflow.
    pub fn standardize(&self, x: f64) -> f64 {
        (x / self.scale - self.mean / self.scale) / (self.std_dev / self.scale)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation around a precomputed mean.
pub fn population_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Largest power of two not above the biggest magnitude (1 for all-zero input).
///
/// Dividing by it is exact and brings every value into `[-2, 2]`.
fn magnitude_scale(values: &[f64]) -> f64 {
    let max_abs = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max_abs == 0.0 || !max_abs.is_finite() {
        return 1.0;
    }
    max_abs.log2().floor().exp2()
}

/// Stats over the non-missing cells; `None` when nothing is present.
pub fn column_stats(column: &[Option<f64>]) -> Option<ColumnStats> {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let scale = magnitude_scale(&present);
    let scaled: Vec<f64> = present.iter().map(|v| v / scale).collect();

    let mean = mean(&scaled)?;
    let std_dev = population_std(&scaled, mean)?;
    let constant = present.windows(2).all(|w| w[0] == w[1]);
    Some(ColumnStats {
        count: present.len(),
        mean: mean * scale,
        std_dev: std_dev * scale,
        constant,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std_of_two_points() {
        let stats = column_stats(&[Some(10.0), Some(20.0)]).unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 15.0).abs() < 1e-12);
        assert!((stats.std_dev - 5.0).abs() < 1e-12);
        assert!(!stats.is_degenerate());
    }

    #[test]
    fn missing_cells_are_ignored() {
        let stats = column_stats(&[None, Some(2.0), None, Some(4.0)]).unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.std_dev - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_is_degenerate_despite_rounding() {
        // 0.1 * 3 / 3 != 0.1 in binary floating point.
        let stats = column_stats(&[Some(0.1), Some(0.1), Some(0.1)]).unwrap();
        assert!(stats.constant);
        assert!(stats.is_degenerate());

        let single = column_stats(&[None, Some(7.0)]).unwrap();
        assert!(single.is_degenerate());
    }

    #[test]
    fn all_missing_has_no_stats() {
        assert!(column_stats(&[None, None]).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn extreme_magnitudes_keep_finite_moments() {
        let stats = column_stats(&[Some(1.0e308), Some(1.7e308)]).unwrap();
        assert!(stats.mean.is_finite());
        assert!(stats.std_dev.is_finite());
        assert!((stats.standardize(1.0e308) + 1.0).abs() < 1e-12);
        assert!((stats.standardize(1.7e308) - 1.0).abs() < 1e-12);

        let spread = column_stats(&[Some(-1.7e308), Some(1.7e308)]).unwrap();
        assert_eq!(spread.mean, 0.0);
        assert!((spread.standardize(-1.7e308) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn tiny_magnitudes_still_standardize() {
        let stats = column_stats(&[Some(1.0e-310), Some(3.0e-310)]).unwrap();
        assert!(!stats.is_degenerate());
        assert!((stats.standardize(3.0e-310) - 1.0).abs() < 1e-9);
    }
}
