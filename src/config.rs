//! Analysis configuration
//!
//! Every design constant of the engine lives here under a name: window sizes,
//! weight tables, scale factors, and category breakpoints. `AnalysisConfig`
//! groups them so a caller can load an alternative set from JSON; its
//! `Default` is exactly the constants below.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Minimum number of nightly records required for an analysis
pub const MIN_RECORDS: usize = 14;

/// Maximum length of the baseline window (nights)
pub const BASELINE_WINDOW_DAYS: usize = 30;

/// Length of the recent window (nights)
pub const RECENT_WINDOW_DAYS: usize = 7;

/// Floor used to keep denominators away from zero
pub const EPSILON: f64 = 1e-6;

/// Two-tailed significance level for the efficiency trend
pub const TREND_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Efficiency slope (points/day) below which a significant trend counts as a decline
pub const EFFICIENCY_DECLINE_THRESHOLD: f64 = -0.02;

/// Degrees of freedom above which the t statistic is treated as normal
pub const NORMAL_APPROXIMATION_MIN_DF: usize = 30;

/// SVI weight table
pub const SVI_WEIGHTS: SviWeights = SviWeights {
    efficiency: 0.25,
    deep_sleep: 0.25,
    rem_sleep: 0.20,
    awakenings: 0.15,
    rmssd: 0.15,
};

/// Empirical normalization mapping typical weighted CVs (0-0.3) onto 0-100
pub const SVI_SCALE_FACTOR: f64 = 200.0;

/// SHDI weight table; sums to exactly 1.0
pub const SHDI_WEIGHTS: ShdiWeights = ShdiWeights {
    fragmentation: 0.30,
    deep_sleep: 0.25,
    rem_sleep: 0.20,
    efficiency: 0.15,
    variability: 0.10,
};

/// Multiplier turning a z-score into an SHDI component
pub const SHDI_Z_COMPONENT_SCALE: f64 = 10.0;

/// Multiplier turning a declining efficiency slope into an SHDI component
pub const SHDI_EFFICIENCY_SLOPE_SCALE: f64 = 50.0;

/// Divisor turning the SVI into an SHDI component
pub const SHDI_VARIABILITY_DIVISOR: f64 = 10.0;

/// SHDI scores below this are `stable`
pub const SHDI_STABLE_BELOW: f64 = 30.0;

/// SHDI scores below this (and not stable) are `moderate_drift`
pub const SHDI_MODERATE_BELOW: f64 = 60.0;

/// SHDI confidence coefficients
pub const SHDI_CONFIDENCE: ConfidenceWeights = ConfidenceWeights {
    floor: 0.35,
    baseline_share: 0.35,
    recent_share: 0.30,
};

/// Multiplier turning a declining efficiency slope into a phenotype score
pub const PHENOTYPE_EFFICIENCY_SLOPE_SCALE: f64 = 30.0;

/// Divisor turning the SVI into a phenotype score term
pub const PHENOTYPE_SVI_DIVISOR: f64 = 50.0;

/// Lowest phenotype confidence, reached on a tie
pub const PHENOTYPE_CONFIDENCE_FLOOR: f64 = 0.2;

/// Score separation at which phenotype confidence saturates
pub const PHENOTYPE_SEPARATION_SATURATION: f64 = 2.0;

/// Weights of the Sleep Variability Index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SviWeights {
    pub efficiency: f64,
    pub deep_sleep: f64,
    pub rem_sleep: f64,
    pub awakenings: f64,
    pub rmssd: f64,
}

impl SviWeights {
    pub fn sum(&self) -> f64 {
        self.efficiency + self.deep_sleep + self.rem_sleep + self.awakenings + self.rmssd
    }
}

/// Weights of the Sleep Health Deviation Index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShdiWeights {
    pub fragmentation: f64,
    pub deep_sleep: f64,
    pub rem_sleep: f64,
    pub efficiency: f64,
    pub variability: f64,
}

impl ShdiWeights {
    pub fn sum(&self) -> f64 {
        self.fragmentation + self.deep_sleep + self.rem_sleep + self.efficiency + self.variability
    }
}

/// Sample-size confidence: `floor + baseline_share * b + recent_share * r`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub floor: f64,
    pub baseline_share: f64,
    pub recent_share: f64,
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub windows: WindowConfig,
    pub trend: TrendConfig,
    pub svi: SviConfig,
    pub shdi: ShdiConfig,
    pub phenotype: PhenotypeConfig,
    /// Denominator floor shared by every stage
    pub epsilon: f64,
}

/// Record-count and window sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub min_records: usize,
    pub baseline_days: usize,
    pub recent_days: usize,
}

/// Trend significance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub significance_level: f64,
    pub efficiency_decline_threshold: f64,
    pub normal_approximation_min_df: usize,
}

/// Sleep Variability Index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SviConfig {
    pub weights: SviWeights,
    pub scale_factor: f64,
}

/// Sleep Health Deviation Index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShdiConfig {
    pub weights: ShdiWeights,
    pub z_component_scale: f64,
    pub efficiency_slope_scale: f64,
    pub variability_divisor: f64,
    pub stable_below: f64,
    pub moderate_below: f64,
    pub confidence: ConfidenceWeights,
}

/// Phenotype classification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhenotypeConfig {
    pub efficiency_slope_scale: f64,
    pub svi_divisor: f64,
    pub confidence_floor: f64,
    pub separation_saturation: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            min_records: MIN_RECORDS,
            baseline_days: BASELINE_WINDOW_DAYS,
            recent_days: RECENT_WINDOW_DAYS,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            significance_level: TREND_SIGNIFICANCE_LEVEL,
            efficiency_decline_threshold: EFFICIENCY_DECLINE_THRESHOLD,
            normal_approximation_min_df: NORMAL_APPROXIMATION_MIN_DF,
        }
    }
}

impl Default for SviConfig {
    fn default() -> Self {
        Self {
            weights: SVI_WEIGHTS,
            scale_factor: SVI_SCALE_FACTOR,
        }
    }
}

impl Default for ShdiConfig {
    fn default() -> Self {
        Self {
            weights: SHDI_WEIGHTS,
            z_component_scale: SHDI_Z_COMPONENT_SCALE,
            efficiency_slope_scale: SHDI_EFFICIENCY_SLOPE_SCALE,
            variability_divisor: SHDI_VARIABILITY_DIVISOR,
            stable_below: SHDI_STABLE_BELOW,
            moderate_below: SHDI_MODERATE_BELOW,
            confidence: SHDI_CONFIDENCE,
        }
    }
}

impl Default for PhenotypeConfig {
    fn default() -> Self {
        Self {
            efficiency_slope_scale: PHENOTYPE_EFFICIENCY_SLOPE_SCALE,
            svi_divisor: PHENOTYPE_SVI_DIVISOR,
            confidence_floor: PHENOTYPE_CONFIDENCE_FLOOR,
            separation_saturation: PHENOTYPE_SEPARATION_SATURATION,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            windows: WindowConfig::default(),
            trend: TrendConfig::default(),
            svi: SviConfig::default(),
            shdi: ShdiConfig::default(),
            phenotype: PhenotypeConfig::default(),
            epsilon: EPSILON,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from JSON; absent fields take their default values
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), AnalysisError> {
        const WEIGHT_TOLERANCE: f64 = 1e-9;

        let w = &self.windows;
        if w.min_records == 0 || w.baseline_days == 0 || w.recent_days == 0 {
            return Err(invalid("window sizes must be positive"));
        }
        if w.recent_days > w.baseline_days {
            return Err(invalid("recent window cannot exceed baseline window"));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(invalid("epsilon must be a positive finite number"));
        }
        if !(self.trend.significance_level > 0.0 && self.trend.significance_level < 1.0) {
            return Err(invalid("significance level must lie in (0, 1)"));
        }
        if (self.svi.weights.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(invalid(&format!(
                "SVI weights sum to {}, expected 1.0",
                self.svi.weights.sum()
            )));
        }
        if (self.shdi.weights.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(invalid(&format!(
                "SHDI weights sum to {}, expected 1.0",
                self.shdi.weights.sum()
            )));
        }
        if self.svi.scale_factor <= 0.0
            || self.shdi.variability_divisor <= 0.0
            || self.phenotype.svi_divisor <= 0.0
            || self.phenotype.separation_saturation <= 0.0
        {
            return Err(invalid("scale factors and divisors must be positive"));
        }
        if !(0.0 < self.shdi.stable_below
            && self.shdi.stable_below < self.shdi.moderate_below
            && self.shdi.moderate_below <= 100.0)
        {
            return Err(invalid("SHDI breakpoints must satisfy 0 < stable < moderate <= 100"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> AnalysisError {
    AnalysisError::InvalidConfig(msg.to_string())
}
