//! Core types for the Somni Drift engine
//!
//! This module defines the data structures that flow through the analysis:
//! nightly input records, the derived statistics of each stage, and the
//! aggregate result handed to report generators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar night's observation from a sleep wearable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Night this record represents (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Total sleep time (minutes, 0-720)
    pub total_sleep_min: u32,
    /// Sleep efficiency (percent, 0-100)
    pub sleep_efficiency: f64,
    /// Deep sleep duration (minutes, 0-360)
    pub deep_sleep_min: u32,
    /// REM sleep duration (minutes, 0-360)
    pub rem_sleep_min: u32,
    /// Number of awakenings (0-50)
    pub awakenings: u32,
}

impl SleepRecord {
    /// Read a single metric as a real number
    pub fn metric(&self, metric: SleepMetric) -> f64 {
        match metric {
            SleepMetric::TotalSleep => f64::from(self.total_sleep_min),
            SleepMetric::Efficiency => self.sleep_efficiency,
            SleepMetric::DeepSleep => f64::from(self.deep_sleep_min),
            SleepMetric::RemSleep => f64::from(self.rem_sleep_min),
            SleepMetric::Awakenings => f64::from(self.awakenings),
        }
    }
}

/// Measured quantities of a sleep record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepMetric {
    TotalSleep,
    Efficiency,
    DeepSleep,
    RemSleep,
    Awakenings,
}

/// Extract one metric across a run of records, in record order
pub fn series(records: &[SleepRecord], metric: SleepMetric) -> Vec<f64> {
    records.iter().map(|r| r.metric(metric)).collect()
}

/// Summary statistics of the baseline window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    pub mean_total_sleep: f64,
    pub std_total_sleep: f64,
    pub mean_efficiency: f64,
    pub std_efficiency: f64,
    pub mean_deep: f64,
    pub std_deep: f64,
    pub mean_rem: f64,
    pub std_rem: f64,
    pub mean_awakenings: f64,
    pub std_awakenings: f64,
    /// Root mean square of successive differences in total sleep time (minutes)
    pub rmssd: f64,
}

impl BaselineMetrics {
    /// Baseline (mean, std) pair for a metric
    pub fn distribution(&self, metric: SleepMetric) -> (f64, f64) {
        match metric {
            SleepMetric::TotalSleep => (self.mean_total_sleep, self.std_total_sleep),
            SleepMetric::Efficiency => (self.mean_efficiency, self.std_efficiency),
            SleepMetric::DeepSleep => (self.mean_deep, self.std_deep),
            SleepMetric::RemSleep => (self.mean_rem, self.std_rem),
            SleepMetric::Awakenings => (self.mean_awakenings, self.std_awakenings),
        }
    }
}

/// Interpretation band of a z-score magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZBand {
    /// |z| < 1
    WithinNormal,
    /// 1 <= |z| < 2
    Moderate,
    /// |z| >= 2
    Significant,
}

impl ZBand {
    pub fn label(&self) -> &'static str {
        match self {
            ZBand::WithinNormal => "Within normal variation",
            ZBand::Moderate => "Moderate deviation",
            ZBand::Significant => "Significant deviation",
        }
    }
}

/// Standard-error-corrected deviations of the recent window from baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScores {
    pub efficiency: f64,
    pub deep_sleep: f64,
    pub rem_sleep: f64,
    pub awakenings: f64,
}

impl ZScores {
    /// Z-score for a metric; total sleep is not scored
    pub fn get(&self, metric: SleepMetric) -> Option<f64> {
        match metric {
            SleepMetric::Efficiency => Some(self.efficiency),
            SleepMetric::DeepSleep => Some(self.deep_sleep),
            SleepMetric::RemSleep => Some(self.rem_sleep),
            SleepMetric::Awakenings => Some(self.awakenings),
            SleepMetric::TotalSleep => None,
        }
    }

    /// Interpretation band for a metric's z-score
    pub fn interpretation(&self, metric: SleepMetric) -> Option<ZBand> {
        self.get(metric).map(crate::deviation::z_band)
    }
}

/// Linear trends over the baseline window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// Efficiency slope (percentage points per day)
    pub efficiency_slope: f64,
    /// Deep sleep slope (minutes per day)
    pub deep_slope: f64,
    /// REM sleep slope (minutes per day)
    pub rem_slope: f64,
    /// Awakenings slope (count per day)
    pub awakenings_slope: f64,
    /// Two-tailed p-value of the efficiency slope
    pub efficiency_pvalue: f64,
    /// True when efficiency is declining significantly
    pub has_significant_trend: bool,
}

/// SHDI category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShdiCategory {
    Stable,
    ModerateDrift,
    SignificantDrift,
}

impl ShdiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShdiCategory::Stable => "stable",
            ShdiCategory::ModerateDrift => "moderate_drift",
            ShdiCategory::SignificantDrift => "significant_drift",
        }
    }
}

/// Sleep Health Deviation Index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShdiScore {
    /// Composite deviation (0-100, higher = more deviation)
    pub score: f64,
    pub category: ShdiCategory,
    /// Confidence from sample-size adequacy (0-1)
    pub confidence: f64,
}

/// Candidate deviation patterns, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskPattern {
    FragmentationDominant,
    DeepSleepReduction,
    RemInstability,
    EfficiencyInstability,
}

impl RiskPattern {
    /// All patterns in enumeration order
    pub const ALL: [RiskPattern; 4] = [
        RiskPattern::FragmentationDominant,
        RiskPattern::DeepSleepReduction,
        RiskPattern::RemInstability,
        RiskPattern::EfficiencyInstability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskPattern::FragmentationDominant => "fragmentation_dominant",
            RiskPattern::DeepSleepReduction => "deep_sleep_reduction",
            RiskPattern::RemInstability => "rem_instability",
            RiskPattern::EfficiencyInstability => "efficiency_instability",
        }
    }
}

/// Body-system labels associated with a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthDomain {
    Cardiovascular,
    Metabolic,
    Cardiometabolic,
    Cognitive,
    Neurological,
    MentalHealth,
}

/// Strength of the literature behind a pattern's domain association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    Strong,
    Moderate,
    Emerging,
}

/// Dominant deviation pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPhenotype {
    pub primary_pattern: RiskPattern,
    /// Separation between the winning and runner-up pattern (0-1)
    pub confidence: f64,
    pub associated_domains: Vec<HealthDomain>,
    pub evidence_strength: EvidenceStrength,
}

/// Complete analysis output
///
/// Plain data with no references back to the input records; safe to
/// serialize, cache, and hand to report generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepAnalysisResult {
    pub days_analyzed: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub baseline: BaselineMetrics,
    pub z_scores: ZScores,
    pub trends: TrendAnalysis,
    /// Sleep Variability Index (0-100)
    pub svi: f64,
    pub shdi: ShdiScore,
    pub phenotype: RiskPhenotype,
}

impl SleepAnalysisResult {
    /// Load a result from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the result to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the result to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
