//! Record validation
//!
//! Range and count checks applied at the ingestion boundary, before records
//! reach the analyzer. The analyzer re-checks the record count itself and
//! rejects a non-finite efficiency, but otherwise treats out-of-range values
//! as a caller precondition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AnalysisError;
use crate::types::SleepRecord;

pub const TOTAL_SLEEP_RANGE: (f64, f64) = (0.0, 720.0);
pub const EFFICIENCY_RANGE: (f64, f64) = (0.0, 100.0);
pub const DEEP_SLEEP_RANGE: (f64, f64) = (0.0, 360.0);
pub const REM_SLEEP_RANGE: (f64, f64) = (0.0, 360.0);
pub const AWAKENINGS_RANGE: (f64, f64) = (0.0, 50.0);

/// A single field outside its allowed range
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} = {value} is out of range (must be {min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl SleepRecord {
    /// Checked constructor
    pub fn new(
        date: NaiveDate,
        total_sleep_min: u32,
        sleep_efficiency: f64,
        deep_sleep_min: u32,
        rem_sleep_min: u32,
        awakenings: u32,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            date,
            total_sleep_min,
            sleep_efficiency,
            deep_sleep_min,
            rem_sleep_min,
            awakenings,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check every numeric field against its closed range
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("total_sleep_min", f64::from(self.total_sleep_min), TOTAL_SLEEP_RANGE)?;
        check_range("sleep_efficiency", self.sleep_efficiency, EFFICIENCY_RANGE)?;
        check_range("deep_sleep_min", f64::from(self.deep_sleep_min), DEEP_SLEEP_RANGE)?;
        check_range("rem_sleep_min", f64::from(self.rem_sleep_min), REM_SLEEP_RANGE)?;
        check_range("awakenings", f64::from(self.awakenings), AWAKENINGS_RANGE)?;
        Ok(())
    }
}

// NaN fails both comparisons and is rejected
fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ValidationError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Outcome of validating a full record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error_message: Option<String>,
    pub num_records: usize,
    /// Earliest and latest night, present when the set is valid
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Validate a record set, stopping at the first problem
pub fn validate_records(records: &[SleepRecord], min_records: usize) -> ValidationReport {
    match check_records(records, min_records) {
        Ok(()) => {
            let date_range = records
                .iter()
                .map(|r| r.date)
                .min()
                .zip(records.iter().map(|r| r.date).max());
            ValidationReport {
                valid: true,
                error_message: None,
                num_records: records.len(),
                date_range,
            }
        }
        Err(e) => ValidationReport {
            valid: false,
            error_message: Some(e.to_string()),
            num_records: records.len(),
            date_range: None,
        },
    }
}

/// Same checks as [`validate_records`], as a `Result`
pub fn check_records(records: &[SleepRecord], min_records: usize) -> Result<(), AnalysisError> {
    if records.len() < min_records {
        return Err(AnalysisError::InsufficientData {
            provided: records.len(),
            required: min_records,
        });
    }
    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|source| AnalysisError::InvalidRecord { index, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn night(day: u32) -> SleepRecord {
        SleepRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            total_sleep_min: 430,
            sleep_efficiency: 88.0,
            deep_sleep_min: 85,
            rem_sleep_min: 100,
            awakenings: 2,
        }
    }

    #[test]
    fn test_checked_constructor() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(SleepRecord::new(date, 430, 88.0, 85, 100, 2).is_ok());
        assert!(SleepRecord::new(date, 721, 88.0, 85, 100, 2).is_err());
        assert!(SleepRecord::new(date, 430, 100.5, 85, 100, 2).is_err());
        assert!(SleepRecord::new(date, 430, f64::NAN, 85, 100, 2).is_err());
        assert!(SleepRecord::new(date, 430, 88.0, 85, 361, 2).is_err());
    }

    #[test]
    fn test_range_boundaries_are_inclusive() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(SleepRecord::new(date, 720, 100.0, 360, 360, 50).is_ok());
        assert!(SleepRecord::new(date, 0, 0.0, 0, 0, 0).is_ok());
    }

    #[test]
    fn test_out_of_range_message_names_field() {
        let mut r = night(1);
        r.awakenings = 51;
        let err = r.validate().unwrap_err();
        assert!(err.to_string().contains("awakenings"));
    }

    #[test]
    fn test_report_insufficient_count() {
        let records: Vec<_> = (1..=10).map(night).collect();
        let report = validate_records(&records, 14);
        assert!(!report.valid);
        assert_eq!(report.num_records, 10);
        assert!(report.error_message.unwrap().contains("minimum 14"));
    }

    #[test]
    fn test_report_points_at_bad_record() {
        let mut records: Vec<_> = (1..=14).map(night).collect();
        records[5].deep_sleep_min = 400;
        let report = validate_records(&records, 14);
        assert!(!report.valid);
        assert!(report.error_message.unwrap().contains("index 5"));
    }

    #[test]
    fn test_report_date_range() {
        let mut records: Vec<_> = (1..=14).map(night).collect();
        records.reverse();
        let report = validate_records(&records, 14);
        assert!(report.valid);
        assert_eq!(
            report.date_range,
            Some((
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
            ))
        );
    }
}
