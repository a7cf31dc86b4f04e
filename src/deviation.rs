//! Deviation scoring
//!
//! Compares the recent window's mean of each scored metric against the
//! baseline distribution using a standard error of the mean, so the spread
//! shrinks as more recent nights are averaged.

use tracing::debug;

use crate::stats::mean;
use crate::types::{series, BaselineMetrics, SleepMetric, SleepRecord, ZBand, ZScores};

/// Compute z-scores for the recent window
pub fn calculate_z_scores(
    recent: &[SleepRecord],
    baseline: &BaselineMetrics,
    epsilon: f64,
) -> ZScores {
    let n_recent = recent.len();
    let z = |metric: SleepMetric| {
        let (baseline_mean, baseline_std) = baseline.distribution(metric);
        let recent_mean = mean(&series(recent, metric));
        z_score(recent_mean, baseline_mean, baseline_std, n_recent, epsilon)
    };

    let scores = ZScores {
        efficiency: z(SleepMetric::Efficiency),
        deep_sleep: z(SleepMetric::DeepSleep),
        rem_sleep: z(SleepMetric::RemSleep),
        awakenings: z(SleepMetric::Awakenings),
    };

    debug!(
        recent_nights = n_recent,
        z_efficiency = scores.efficiency,
        z_deep = scores.deep_sleep,
        z_rem = scores.rem_sleep,
        z_awakenings = scores.awakenings,
        "computed z-scores"
    );

    scores
}

/// Standard-error-corrected z-score
///
/// Formula:
/// ```text
/// sem = max(std / sqrt(n), epsilon * (|mean| + 1), epsilon)
/// z   = (recent_mean - baseline_mean) / sem
/// ```
pub fn z_score(
    recent_mean: f64,
    baseline_mean: f64,
    baseline_std: f64,
    n_recent: usize,
    epsilon: f64,
) -> f64 {
    let sem_raw = if n_recent > 0 {
        baseline_std / (n_recent as f64).sqrt()
    } else {
        0.0
    };
    let sem = sem_raw
        .max(epsilon * (baseline_mean.abs() + 1.0))
        .max(epsilon);
    (recent_mean - baseline_mean) / sem
}

/// Interpretation band of a z-score
pub fn z_band(z: f64) -> ZBand {
    let magnitude = z.abs();
    if magnitude < 1.0 {
        ZBand::WithinNormal
    } else if magnitude < 2.0 {
        ZBand::Moderate
    } else {
        ZBand::Significant
    }
}
