//! Analysis orchestration
//!
//! This module provides the public API for Somni Drift.
//! It runs the full pipeline from nightly records to a self-contained
//! [`SleepAnalysisResult`].

use tracing::{debug, warn};

use crate::baseline::compute_baseline_stats;
use crate::config::AnalysisConfig;
use crate::deviation::calculate_z_scores;
use crate::error::AnalysisError;
use crate::phenotype::classify_phenotype;
use crate::shdi::{calculate_shdi, SampleSize};
use crate::trend::detect_trends;
use crate::types::{SleepAnalysisResult, SleepRecord};
use crate::variability::sleep_variability_index;
use crate::window::{sort_chronologically, AnalysisWindows};

/// Analyze nightly records with the default configuration.
///
/// # Example
/// ```ignore
/// let result = somni_drift::analyze(&records)?;
/// println!("SHDI {:.1} ({})", result.shdi.score, result.shdi.category.as_str());
/// ```
pub fn analyze(records: &[SleepRecord]) -> Result<SleepAnalysisResult, AnalysisError> {
    SleepAnalyzer::new().analyze(records)
}

/// Analyze a JSON array of records and return the result as JSON.
///
/// # Arguments
/// * `records_json` - JSON array of `SleepRecord` objects
///
/// # Returns
/// Compact `SleepAnalysisResult` JSON
pub fn analyze_json(records_json: &str) -> Result<String, AnalysisError> {
    let records: Vec<SleepRecord> = serde_json::from_str(records_json)?;
    let result = analyze(&records)?;
    Ok(result.to_json()?)
}

/// Stateless analyzer holding a validated configuration.
///
/// The same analyzer may be shared across threads; `analyze` never mutates it.
#[derive(Debug, Clone, Default)]
pub struct SleepAnalyzer {
    config: AnalysisConfig,
}

impl SleepAnalyzer {
    /// Create an analyzer with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom configuration
    pub fn with_config(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full analysis.
    ///
    /// Pipeline stages:
    /// 1. Windowing - Sort chronologically, select baseline and recent windows
    /// 2. Baseline - Per-metric mean and spread over the baseline window
    /// 3. Deviation - SEM-corrected z-scores of the recent window
    /// 4. Trends - OLS slopes over the baseline window
    /// 5. Variability - SVI over the whole history
    /// 6. SHDI and phenotype - Composite score and dominant pattern
    pub fn analyze(&self, records: &[SleepRecord]) -> Result<SleepAnalysisResult, AnalysisError> {
        let config = &self.config;

        if records.len() < config.windows.min_records {
            return Err(AnalysisError::InsufficientData {
                provided: records.len(),
                required: config.windows.min_records,
            });
        }

        for (index, record) in records.iter().enumerate() {
            if let Err(source) = record.validate() {
                // NaN or infinity would leak into every statistic and the result JSON
                if !record.sleep_efficiency.is_finite() {
                    return Err(AnalysisError::InvalidRecord { index, source });
                }
                warn!(index, date = %record.date, error = %source, "record outside expected range");
            }
        }

        // Stage 1: Sort and window
        let sorted = sort_chronologically(records);
        let windows = AnalysisWindows::select(&sorted, &config.windows);

        // Stage 2: Baseline statistics
        let baseline = compute_baseline_stats(&sorted, &config.windows)?;

        // Stage 3: Z-scores
        let z_scores = calculate_z_scores(windows.recent, &baseline, config.epsilon);

        // Stage 4: Trends
        let trends = detect_trends(windows.baseline, &config.trend);

        // Stage 5: Variability
        let svi = sleep_variability_index(windows.history, &config.svi, config.epsilon);

        // Stage 6: Composite indices
        let shdi = calculate_shdi(
            &z_scores,
            &trends,
            svi,
            SampleSize::of(&windows),
            &config.windows,
            &config.shdi,
        );
        let phenotype = classify_phenotype(&z_scores, &trends, svi, &config.phenotype);

        let (start_date, end_date) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => {
                return Err(AnalysisError::InsufficientData {
                    provided: 0,
                    required: config.windows.min_records,
                })
            }
        };

        debug!(
            days = sorted.len(),
            %start_date,
            %end_date,
            shdi = shdi.score,
            pattern = phenotype.primary_pattern.as_str(),
            "analysis complete"
        );

        Ok(SleepAnalysisResult {
            days_analyzed: sorted.len(),
            start_date,
            end_date,
            baseline,
            z_scores,
            trends,
            svi,
            shdi,
            phenotype,
        })
    }
}
