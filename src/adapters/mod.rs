//! Export file adapters
//!
//! This module provides adapters that parse wearable export files and map them
//! to vendor-agnostic [`SleepRecord`]s. Adapters do not range-check values;
//! run [`crate::validation::validate_records`] before analysis.

mod apple_health;
mod fitbit;
mod json;
mod oura;

pub use apple_health::AppleHealthXmlAdapter;
pub use fitbit::FitbitCsvAdapter;
pub use json::JsonRecordsAdapter;
pub use oura::OuraCsvAdapter;

use chrono::NaiveDate;
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::SleepRecord;

/// Trait for export file adapters
pub trait SleepExportAdapter {
    /// Parse file content into nightly records
    fn parse(&self, content: &str) -> Result<Vec<SleepRecord>, AnalysisError>;
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    FitbitCsv,
    OuraCsv,
    AppleHealthXml,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::FitbitCsv => "fitbit_csv",
            ExportFormat::OuraCsv => "oura_csv",
            ExportFormat::AppleHealthXml => "apple_health_xml",
        }
    }
}

/// Detect the export format from the file name and content
pub fn detect_format(content: &str, filename: &str) -> Result<ExportFormat, AnalysisError> {
    let name = filename.to_ascii_lowercase();
    let trimmed = content.trim_start();

    if name.ends_with(".xml") || trimmed.starts_with("<?xml") {
        return Ok(ExportFormat::AppleHealthXml);
    }
    if name.ends_with(".json") || trimmed.starts_with('[') {
        return Ok(ExportFormat::Json);
    }
    if name.ends_with(".csv") {
        let header = content.lines().next().unwrap_or_default().to_ascii_lowercase();
        if header.contains("oura") || header.contains("total_sleep_duration") {
            return Ok(ExportFormat::OuraCsv);
        }
        return Ok(ExportFormat::FitbitCsv);
    }

    Err(AnalysisError::UnsupportedFormat(format!(
        "{filename}: expected a .json, .xml, Fitbit .csv or Oura .csv export"
    )))
}

/// Parse with an explicit format
pub fn parse_with_format(
    content: &str,
    format: ExportFormat,
) -> Result<Vec<SleepRecord>, AnalysisError> {
    match format {
        ExportFormat::Json => JsonRecordsAdapter.parse(content),
        ExportFormat::FitbitCsv => FitbitCsvAdapter.parse(content),
        ExportFormat::OuraCsv => OuraCsvAdapter.parse(content),
        ExportFormat::AppleHealthXml => AppleHealthXmlAdapter.parse(content),
    }
}

/// Detect the format, then parse
pub fn parse_export(content: &str, filename: &str) -> Result<Vec<SleepRecord>, AnalysisError> {
    let format = detect_format(content, filename)?;
    tracing::debug!(filename, format = format.as_str(), "detected export format");
    parse_with_format(content, format)
}

/// Header lookup accepting several spellings per column
pub(crate) struct Columns {
    headers: StringRecord,
}

impl Columns {
    pub(crate) fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers.iter().map(str::trim).collect(),
        }
    }

    pub(crate) fn position(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == *alias))
    }

    /// Trimmed, non-empty cell of the first matching column
    pub(crate) fn get<'r>(&self, row: &'r StringRecord, aliases: &[&str]) -> Option<&'r str> {
        self.position(aliases)
            .and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn require<'r>(
        &self,
        row: &'r StringRecord,
        aliases: &[&str],
        line: usize,
    ) -> Result<&'r str, AnalysisError> {
        self.get(row, aliases).ok_or_else(|| {
            AnalysisError::MissingField(format!("{} (line {line})", aliases[0]))
        })
    }
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time component
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, AnalysisError> {
    let day = value
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| AnalysisError::DateParseError(format!("{value}: {e}")))
}

pub(crate) fn parse_number<T: std::str::FromStr>(
    value: &str,
    column: &str,
    line: usize,
) -> Result<T, AnalysisError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| AnalysisError::ParseError(format!("{column} = {value:?} (line {line}): {e}")))
}
