//! Sleep Health Deviation Index
//!
//! Combines one-sided and absolute deviation components into a single 0-100
//! score. Lower deep sleep and more awakenings are concerning; the opposite
//! directions are not. REM deviation counts either way.

use tracing::debug;

use crate::config::{ShdiConfig, WindowConfig};
use crate::types::{ShdiCategory, ShdiScore, TrendAnalysis, ZScores};
use crate::window::AnalysisWindows;

/// Nights actually observed in each window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSize {
    pub baseline_days: usize,
    pub recent_days: usize,
}

impl SampleSize {
    pub fn of(windows: &AnalysisWindows<'_>) -> Self {
        Self {
            baseline_days: windows.baseline.len(),
            recent_days: windows.recent.len(),
        }
    }
}

/// Non-negative inputs to the SHDI weighted sum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShdiComponents {
    pub fragmentation: f64,
    pub deep_sleep: f64,
    pub rem_sleep: f64,
    pub efficiency: f64,
    pub variability: f64,
}

impl ShdiComponents {
    /// Formula:
    /// ```text
    /// fragmentation = max(0,  z_awakenings) * 10
    /// deep_sleep    = max(0, -z_deep_sleep) * 10
    /// rem_sleep     = |z_rem_sleep| * 10
    /// efficiency    = max(0, -efficiency_slope * 50)
    /// variability   = SVI / 10
    /// ```
    pub fn from_inputs(z: &ZScores, trends: &TrendAnalysis, svi: f64, config: &ShdiConfig) -> Self {
        Self {
            fragmentation: z.awakenings.max(0.0) * config.z_component_scale,
            deep_sleep: (-z.deep_sleep).max(0.0) * config.z_component_scale,
            rem_sleep: z.rem_sleep.abs() * config.z_component_scale,
            efficiency: (-trends.efficiency_slope * config.efficiency_slope_scale).max(0.0),
            variability: svi / config.variability_divisor,
        }
    }

    fn weighted_sum(&self, config: &ShdiConfig) -> f64 {
        let w = &config.weights;
        w.fragmentation * self.fragmentation
            + w.deep_sleep * self.deep_sleep
            + w.rem_sleep * self.rem_sleep
            + w.efficiency * self.efficiency
            + w.variability * self.variability
    }
}

/// Calculate the SHDI
///
/// Confidence depends only on how much history was observed:
/// `min(1, 0.35 + 0.35 * min(1, baseline/30) + 0.30 * min(1, recent/7))`.
pub fn calculate_shdi(
    z: &ZScores,
    trends: &TrendAnalysis,
    svi: f64,
    sample: SampleSize,
    windows: &WindowConfig,
    config: &ShdiConfig,
) -> ShdiScore {
    let components = ShdiComponents::from_inputs(z, trends, svi, config);
    let score = clamp_score(components.weighted_sum(config));
    let category = ShdiCategory::from_score(score, config);
    let confidence = sample_confidence(sample, windows, config);

    debug!(
        score,
        category = category.as_str(),
        confidence,
        fragmentation = components.fragmentation,
        deep_sleep = components.deep_sleep,
        rem_sleep = components.rem_sleep,
        "calculated SHDI"
    );

    ShdiScore {
        score,
        category,
        confidence,
    }
}

// NaN collapses to 0 rather than leaking into the category
fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 100.0)
    }
}

fn sample_confidence(sample: SampleSize, windows: &WindowConfig, config: &ShdiConfig) -> f64 {
    let fraction = |have: usize, full: usize| (have as f64 / full.max(1) as f64).min(1.0);
    let c = &config.confidence;
    (c.floor
        + c.baseline_share * fraction(sample.baseline_days, windows.baseline_days)
        + c.recent_share * fraction(sample.recent_days, windows.recent_days))
    .min(1.0)
}

impl ShdiCategory {
    /// Map a score onto the fixed breakpoints (`< 30`, `< 60`, else)
    pub fn from_score(score: f64, config: &ShdiConfig) -> Self {
        if score < config.stable_below {
            ShdiCategory::Stable
        } else if score < config.moderate_below {
            ShdiCategory::ModerateDrift
        } else {
            ShdiCategory::SignificantDrift
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros() -> ZScores {
        ZScores {
            efficiency: 0.0,
            deep_sleep: 0.0,
            rem_sleep: 0.0,
            awakenings: 0.0,
        }
    }

    fn flat_trend() -> TrendAnalysis {
        TrendAnalysis {
            efficiency_slope: 0.0,
            deep_slope: 0.0,
            rem_slope: 0.0,
            awakenings_slope: 0.0,
            efficiency_pvalue: 1.0,
            has_significant_trend: false,
        }
    }

    fn shdi(z: &ZScores, trends: &TrendAnalysis, svi: f64, baseline: usize, recent: usize) -> ShdiScore {
        let sample = SampleSize {
            baseline_days: baseline,
            recent_days: recent,
        };
        calculate_shdi(
            z,
            trends,
            svi,
            sample,
            &WindowConfig::default(),
            &ShdiConfig::default(),
        )
    }

    #[test]
    fn test_no_deviation_is_stable() {
        let result = shdi(&zeros(), &flat_trend(), 0.0, 30, 7);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.category, ShdiCategory::Stable);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_one_sided_components() {
        let config = ShdiConfig::default();
        // Fewer awakenings, more deep sleep: not concerning
        let good = ZScores {
            awakenings: -3.0,
            deep_sleep: 3.0,
            ..zeros()
        };
        let c = ShdiComponents::from_inputs(&good, &flat_trend(), 0.0, &config);
        assert_eq!(c.fragmentation, 0.0);
        assert_eq!(c.deep_sleep, 0.0);

        // REM counts in both directions
        let rem_low = ZScores { rem_sleep: -2.0, ..zeros() };
        let c = ShdiComponents::from_inputs(&rem_low, &flat_trend(), 0.0, &config);
        assert_eq!(c.rem_sleep, 20.0);

        // Improving efficiency contributes nothing
        let improving = TrendAnalysis {
            efficiency_slope: 0.5,
            ..flat_trend()
        };
        let c = ShdiComponents::from_inputs(&zeros(), &improving, 0.0, &config);
        assert_eq!(c.efficiency, 0.0);
    }

    #[test]
    fn test_weighted_sum() {
        let z = ZScores {
            awakenings: 2.0,
            deep_sleep: -2.0,
            rem_sleep: 1.0,
            ..zeros()
        };
        let trends = TrendAnalysis {
            efficiency_slope: -0.2,
            ..flat_trend()
        };
        // 0.30*20 + 0.25*20 + 0.20*10 + 0.15*10 + 0.10*5 = 15
        let result = shdi(&z, &trends, 50.0, 30, 7);
        assert!((result.score - 15.0).abs() < 1e-9);
        assert_eq!(result.category, ShdiCategory::Stable);
    }

    #[test]
    fn test_score_clamped() {
        let z = ZScores {
            awakenings: 1e6,
            ..zeros()
        };
        let result = shdi(&z, &flat_trend(), 0.0, 30, 7);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.category, ShdiCategory::SignificantDrift);
    }

    #[test]
    fn test_category_breakpoints() {
        let config = ShdiConfig::default();
        assert_eq!(ShdiCategory::from_score(0.0, &config), ShdiCategory::Stable);
        assert_eq!(ShdiCategory::from_score(29.999, &config), ShdiCategory::Stable);
        assert_eq!(ShdiCategory::from_score(30.0, &config), ShdiCategory::ModerateDrift);
        assert_eq!(ShdiCategory::from_score(59.999, &config), ShdiCategory::ModerateDrift);
        assert_eq!(ShdiCategory::from_score(60.0, &config), ShdiCategory::SignificantDrift);
        assert_eq!(ShdiCategory::from_score(100.0, &config), ShdiCategory::SignificantDrift);
    }

    #[test]
    fn test_confidence_from_sample_size() {
        let minimal = shdi(&zeros(), &flat_trend(), 0.0, 14, 7);
        let expected = 0.35 + 0.35 * (14.0 / 30.0) + 0.30;
        assert!((minimal.confidence - expected).abs() < 1e-12);

        let short_recent = shdi(&zeros(), &flat_trend(), 0.0, 30, 3);
        let expected = 0.35 + 0.35 + 0.30 * (3.0 / 7.0);
        assert!((short_recent.confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_independent_of_magnitude() {
        let big = ZScores {
            awakenings: 8.0,
            deep_sleep: -8.0,
            ..zeros()
        };
        let a = shdi(&zeros(), &flat_trend(), 0.0, 20, 7);
        let b = shdi(&big, &flat_trend(), 80.0, 20, 7);
        assert_eq!(a.confidence, b.confidence);
    }
}
