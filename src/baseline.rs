//! Baseline statistics
//!
//! This module characterizes a person's "normal" sleep from the baseline
//! window: population mean and standard deviation per metric, plus RMSSD of
//! total sleep time as a night-to-night instability measure.

use tracing::debug;

use crate::config::WindowConfig;
use crate::error::AnalysisError;
use crate::stats::{mean, population_std, rmssd};
use crate::types::{series, BaselineMetrics, SleepMetric, SleepRecord};
use crate::window::tail;

/// Compute baseline statistics from a chronologically sorted history
///
/// Fails with [`AnalysisError::InsufficientData`] before any statistic is
/// computed when the history is shorter than `config.min_records`.
pub fn compute_baseline_stats(
    sorted: &[SleepRecord],
    config: &WindowConfig,
) -> Result<BaselineMetrics, AnalysisError> {
    if sorted.len() < config.min_records {
        return Err(AnalysisError::InsufficientData {
            provided: sorted.len(),
            required: config.min_records,
        });
    }

    Ok(baseline_from_window(tail(sorted, config.baseline_days)))
}

/// Statistics of an already selected baseline window
///
/// An empty window yields all zeros; a single night yields zero spread and
/// zero RMSSD.
pub fn baseline_from_window(window: &[SleepRecord]) -> BaselineMetrics {
    let describe = |metric: SleepMetric| {
        let values = series(window, metric);
        (mean(&values), population_std(&values))
    };

    let (mean_total_sleep, std_total_sleep) = describe(SleepMetric::TotalSleep);
    let (mean_efficiency, std_efficiency) = describe(SleepMetric::Efficiency);
    let (mean_deep, std_deep) = describe(SleepMetric::DeepSleep);
    let (mean_rem, std_rem) = describe(SleepMetric::RemSleep);
    let (mean_awakenings, std_awakenings) = describe(SleepMetric::Awakenings);

    let rmssd = rmssd(&series(window, SleepMetric::TotalSleep));

    debug!(
        nights = window.len(),
        mean_total_sleep,
        mean_efficiency,
        rmssd,
        "computed baseline"
    );

    BaselineMetrics {
        mean_total_sleep,
        std_total_sleep,
        mean_efficiency,
        std_efficiency,
        mean_deep,
        std_deep,
        mean_rem,
        std_rem,
        mean_awakenings,
        std_awakenings,
        rmssd,
    }
}
