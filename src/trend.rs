//! Trend detection
//!
//! Fits an ordinary least-squares line per metric against a 0-based day index
//! over the baseline window. Only the efficiency slope is tested for
//! significance, and only a significant decline raises the trend flag.

use tracing::debug;

use crate::config::TrendConfig;
use crate::stats::{linear_fit, slope_p_value};
use crate::types::{series, SleepMetric, SleepRecord, TrendAnalysis};

/// Detect linear trends over the baseline window
pub fn detect_trends(window: &[SleepRecord], config: &TrendConfig) -> TrendAnalysis {
    let slope_of = |metric: SleepMetric| {
        linear_fit(&series(window, metric))
            .map(|fit| fit.slope)
            .unwrap_or(0.0)
    };

    let (efficiency_slope, efficiency_pvalue) =
        match linear_fit(&series(window, SleepMetric::Efficiency)) {
            Some(fit) => (fit.slope, slope_p_value(&fit, config.normal_approximation_min_df)),
            None => (0.0, 1.0),
        };

    let has_significant_trend = efficiency_pvalue < config.significance_level
        && efficiency_slope < config.efficiency_decline_threshold;

    let trends = TrendAnalysis {
        efficiency_slope,
        deep_slope: slope_of(SleepMetric::DeepSleep),
        rem_slope: slope_of(SleepMetric::RemSleep),
        awakenings_slope: slope_of(SleepMetric::Awakenings),
        efficiency_pvalue,
        has_significant_trend,
    };

    debug!(
        nights = window.len(),
        efficiency_slope,
        efficiency_pvalue,
        has_significant_trend,
        "detected trends"
    );

    trends
}
