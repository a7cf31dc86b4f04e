//! Fitbit CSV adapter
//!
//! Accepts both the snake_case columns of the account export and the
//! human-readable headers of the dashboard download.

use csv::ReaderBuilder;

use super::{parse_date, parse_number, Columns, SleepExportAdapter};
use crate::error::AnalysisError;
use crate::types::SleepRecord;

const DATE: &[&str] = &["date", "Date"];
const EFFICIENCY: &[&str] = &["sleep_efficiency", "Sleep Efficiency %"];
const DEEP: &[&str] = &["deep_sleep_min", "Minutes Deep Sleep"];
const REM: &[&str] = &["rem_sleep_min", "Minutes REM Sleep"];
const AWAKENINGS: &[&str] = &["awakenings", "Number of Awakenings"];
const TOTAL: &[&str] = &["total_sleep_min", "Minutes Asleep"];

/// Share of the night assumed to be deep + REM when total sleep is absent
const DEEP_REM_SHARE: f64 = 0.5;

/// Fitbit sleep export adapter
pub struct FitbitCsvAdapter;

impl SleepExportAdapter for FitbitCsvAdapter {
    fn parse(&self, content: &str) -> Result<Vec<SleepRecord>, AnalysisError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let columns = Columns::new(reader.headers()?);
        let has_total = columns.position(TOTAL).is_some();

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            let line = i + 2;

            // Blank rows and footer lines carry no date
            let Some(date) = columns.get(&row, DATE) else {
                continue;
            };

            let deep_sleep_min: u32 = parse_number(columns.require(&row, DEEP, line)?, DEEP[0], line)?;
            let rem_sleep_min: u32 = parse_number(columns.require(&row, REM, line)?, REM[0], line)?;
            let total_sleep_min = if has_total {
                parse_number(columns.require(&row, TOTAL, line)?, TOTAL[0], line)?
            } else {
                ((f64::from(deep_sleep_min) + f64::from(rem_sleep_min)) / DEEP_REM_SHARE) as u32
            };

            records.push(SleepRecord {
                date: parse_date(date)?,
                total_sleep_min,
                sleep_efficiency: parse_number(
                    columns.require(&row, EFFICIENCY, line)?,
                    EFFICIENCY[0],
                    line,
                )?,
                deep_sleep_min,
                rem_sleep_min,
                awakenings: parse_number(columns.require(&row, AWAKENINGS, line)?, AWAKENINGS[0], line)?,
            });
        }

        tracing::debug!(records = records.len(), "parsed Fitbit export");
        Ok(records)
    }
}
