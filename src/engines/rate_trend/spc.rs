use serde::{Deserialize, Serialize};

/// Three-sigma statistical process control bounds over a rate series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    pub mean: f64,
    pub stddev: f64,
    pub ucl: f64,
    pub lcl: f64,
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with an n-1 denominator; 0 for fewer than two
/// points.
pub(crate) fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - mu).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

pub(crate) fn control_limits(values: &[f64]) -> ControlLimits {
    let mu = mean(values);
    let sigma = sample_stddev(values);
    ControlLimits {
        mean: mu,
        stddev: sigma,
        ucl: mu + 3.0 * sigma,
        lcl: (mu - 3.0 * sigma).max(0.0),
    }
}

/// Ordinary least-squares slope of the series against its point index; 0 for
/// fewer than two points.
pub(crate) fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = mean(values);
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (index, value) in values.iter().enumerate() {
        let dx = index as f64 - x_mean;
        numerator += dx * (value - y_mean);
        denominator += dx * dx;
    }
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_is_zero_below_two_points() {
        assert_eq!(sample_stddev(&[]), 0.0);
        assert_eq!(sample_stddev(&[4.2]), 0.0);
    }

    #[test]
    fn control_limits_match_three_sigma_formula() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let limits = control_limits(&values);
        assert!((limits.mean - 5.0).abs() < 1e-9);
        // sample stddev of this classic series is sqrt(32/7)
        let sigma = (32.0_f64 / 7.0).sqrt();
        assert!((limits.stddev - sigma).abs() < 1e-9);
        assert!((limits.ucl - (5.0 + 3.0 * sigma)).abs() < 1e-9);
        assert!((limits.lcl - (5.0 - 3.0 * sigma).max(0.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_variance_collapses_limits_onto_mean() {
        let limits = control_limits(&[2.0, 2.0, 2.0, 2.0]);
        assert_eq!(limits.ucl, limits.mean);
        assert_eq!(limits.lcl, limits.mean);
        assert_eq!(limits.mean, 2.0);
    }

    #[test]
    fn lcl_never_goes_negative() {
        let limits = control_limits(&[0.1, 0.2, 5.0]);
        assert!(limits.lcl >= 0.0);
    }

    #[test]
    fn ols_slope_recovers_linear_trend() {
        let values = [1.0, 3.0, 5.0, 7.0];
        assert!((ols_slope(&values) - 2.0).abs() < 1e-9);
        assert_eq!(ols_slope(&[5.0]), 0.0);
        assert!((ols_slope(&[4.0, 4.0, 4.0])).abs() < 1e-9);
    }
}
