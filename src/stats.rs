//! Descriptive statistics and regression helpers
//!
//! All spreads are population statistics (divide by N): they describe the
//! observed nights rather than estimate a wider population.

use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population standard deviation; 0.0 for an empty slice
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Root mean square of successive differences
///
/// Formula: `sqrt(mean((x[i+1] - x[i])^2))`
///
/// Fewer than two values have no successive difference; the result is 0.0.
pub fn rmssd(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let squared: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).powi(2)).collect();
    mean(&squared).sqrt()
}

/// Coefficient of variation with an epsilon-floored denominator
///
/// Formula: `std / max(mean, epsilon)`
pub fn coefficient_of_variation(values: &[f64], epsilon: f64) -> f64 {
    population_std(values) / mean(values).max(epsilon)
}

/// Ordinary least-squares fit of values against a 0-based day index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Residual sum of squares
    pub residual_ss: f64,
    /// Sum of squared deviations of the day index
    pub sxx: f64,
    pub n: usize,
}

/// Fit `y = intercept + slope * day` with day = 0, 1, 2, ...
///
/// Returns `None` for an empty series. A single point has zero slope.
pub fn linear_fit(values: &[f64]) -> Option<LinearFit> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxx += dx * dx;
        sxy += dx * (y - y_mean);
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    let residual_ss = values
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (intercept + slope * i as f64)).powi(2))
        .sum();

    Some(LinearFit {
        slope,
        intercept,
        residual_ss,
        sxx,
        n,
    })
}

/// Two-tailed p-value for a fitted slope being nonzero
///
/// RSS → MSE → standard error of the slope → t statistic → p-value. For
/// `df > normal_min_df` the t statistic is read against the standard normal;
/// below that it is first mapped to an approximate normal deviate
/// `z = |t| (1 - 1/(4 df)) / sqrt(1 + t^2 / (2 df))`. Adequate for a
/// threshold decision, not for reporting exact intervals.
pub fn slope_p_value(fit: &LinearFit, normal_min_df: usize) -> f64 {
    if fit.n < 3 || fit.sxx <= 0.0 {
        return 1.0;
    }

    let df = (fit.n - 2) as f64;
    let mse = fit.residual_ss / df;
    let se = (mse / fit.sxx).sqrt();

    if se == 0.0 || !se.is_finite() {
        // Perfect fit: any nonzero slope is certain
        return if fit.slope == 0.0 { 1.0 } else { 0.0 };
    }

    let t = fit.slope / se;
    let z = if fit.n - 2 > normal_min_df {
        t.abs()
    } else {
        t.abs() * (1.0 - 1.0 / (4.0 * df)) / (1.0 + t * t / (2.0 * df)).sqrt()
    };

    two_tailed_normal_p(z)
}

/// Two-tailed p-value of a standard normal deviate
fn two_tailed_normal_p(z: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
