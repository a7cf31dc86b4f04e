//! JSON records adapter

use super::SleepExportAdapter;
use crate::error::AnalysisError;
use crate::types::SleepRecord;

/// JSON array of records with `YYYY-MM-DD` dates
pub struct JsonRecordsAdapter;

impl SleepExportAdapter for JsonRecordsAdapter {
    fn parse(&self, content: &str) -> Result<Vec<SleepRecord>, AnalysisError> {
        Ok(serde_json::from_str(content)?)
    }
}
