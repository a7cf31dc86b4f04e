//! Oura CSV adapter
//!
//! Oura reports stage durations in seconds and has no awakening count, so
//! awakenings are estimated from total awake time.

use csv::ReaderBuilder;

use super::{parse_date, parse_number, Columns, SleepExportAdapter};
use crate::error::AnalysisError;
use crate::types::SleepRecord;

const DATE: &[&str] = &["date", "day"];
const TOTAL: &[&str] = &["total_sleep_duration"];
const EFFICIENCY: &[&str] = &["sleep_efficiency", "efficiency"];
const DEEP: &[&str] = &["deep_sleep_duration"];
const REM: &[&str] = &["rem_sleep_duration"];
const AWAKE: &[&str] = &["awake_time"];

/// Awake minutes per estimated awakening
const AWAKE_MINUTES_PER_AWAKENING: u32 = 10;

/// Oura ring sleep export adapter
pub struct OuraCsvAdapter;

impl SleepExportAdapter for OuraCsvAdapter {
    fn parse(&self, content: &str) -> Result<Vec<SleepRecord>, AnalysisError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let columns = Columns::new(reader.headers()?);

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            let line = i + 2;

            let Some(date) = columns.get(&row, DATE) else {
                continue;
            };
            let minutes = |aliases: &[&str]| -> Result<u32, AnalysisError> {
                let seconds: u32 = parse_number(columns.require(&row, aliases, line)?, aliases[0], line)?;
                Ok(seconds / 60)
            };

            let awake_minutes = minutes(AWAKE)?;
            records.push(SleepRecord {
                date: parse_date(date)?,
                total_sleep_min: minutes(TOTAL)?,
                sleep_efficiency: parse_number(
                    columns.require(&row, EFFICIENCY, line)?,
                    EFFICIENCY[0],
                    line,
                )?,
                deep_sleep_min: minutes(DEEP)?,
                rem_sleep_min: minutes(REM)?,
                awakenings: (awake_minutes / AWAKE_MINUTES_PER_AWAKENING).max(1),
            });
        }

        tracing::debug!(records = records.len(), "parsed Oura export");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "date,total_sleep_duration,sleep_efficiency,deep_sleep_duration,rem_sleep_duration,awake_time\n";

    #[test]
    fn test_seconds_to_minutes() {
        let csv = format!("{HEADER}2024-03-01,27000,92,5430,6000,1800\n");
        let records = OuraCsvAdapter.parse(&csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_sleep_min, 450);
        // 90.5 minutes truncates
        assert_eq!(records[0].deep_sleep_min, 90);
        assert_eq!(records[0].rem_sleep_min, 100);
        assert_eq!(records[0].sleep_efficiency, 92.0);
        assert_eq!(records[0].awakenings, 3);
    }

    #[test]
    fn test_awakenings_floor_of_one() {
        let csv = format!("{HEADER}2024-03-01,27000,95,5400,6000,120\n");
        let records = OuraCsvAdapter.parse(&csv).unwrap();
        assert_eq!(records[0].awakenings, 1);
    }

    #[test]
    fn test_missing_duration_is_an_error() {
        let csv = "date,total_sleep_duration,sleep_efficiency\n2024-03-01,27000,92\n";
        assert!(matches!(
            OuraCsvAdapter.parse(csv),
            Err(AnalysisError::MissingField(_))
        ));
    }

    #[test]
    fn test_invalid_date() {
        let csv = format!("{HEADER}March 1,27000,92,5400,6000,600\n");
        assert!(matches!(
            OuraCsvAdapter.parse(&csv),
            Err(AnalysisError::DateParseError(_))
        ));
    }
}
