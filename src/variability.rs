//! Sleep Variability Index
//!
//! Aggregates night-to-night instability across the entire supplied history
//! (not just the baseline window) into a 0-100 score.

use tracing::debug;

use crate::config::SviConfig;
use crate::stats::{coefficient_of_variation, mean, rmssd};
use crate::types::{series, SleepMetric, SleepRecord};

/// Compute the Sleep Variability Index
///
/// Formula:
/// ```text
/// raw = 0.25 * cv(efficiency) + 0.25 * cv(deep) + 0.20 * cv(rem)
///     + 0.15 * cv(awakenings) + 0.15 * rmssd(total) / mean(total)
/// SVI = clamp(raw * 200, 0, 100)
/// ```
pub fn sleep_variability_index(history: &[SleepRecord], config: &SviConfig, epsilon: f64) -> f64 {
    let cv = |metric: SleepMetric| coefficient_of_variation(&series(history, metric), epsilon);

    let total_sleep = series(history, SleepMetric::TotalSleep);
    let rmssd_normalized = rmssd(&total_sleep) / mean(&total_sleep).max(epsilon);

    let w = &config.weights;
    let raw = w.efficiency * cv(SleepMetric::Efficiency)
        + w.deep_sleep * cv(SleepMetric::DeepSleep)
        + w.rem_sleep * cv(SleepMetric::RemSleep)
        + w.awakenings * cv(SleepMetric::Awakenings)
        + w.rmssd * rmssd_normalized;

    let svi = (raw * config.scale_factor).clamp(0.0, 100.0);

    debug!(nights = history.len(), raw, svi, "computed sleep variability index");

    svi
}
