//! Apple Health XML adapter
//!
//! `export.xml` stores one `Record` per sleep-stage interval. Intervals are
//! summed per night; a night is keyed by its wake-up date, so the evening
//! before midnight and the early morning after it land on the same record.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use roxmltree::{Document, ParsingOptions};

use super::SleepExportAdapter;
use crate::error::AnalysisError;
use crate::types::SleepRecord;

const SLEEP_ANALYSIS: &str = "HKCategoryTypeIdentifierSleepAnalysis";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Intervals starting at or after noon belong to the next day's night
const NIGHT_ROLLOVER_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SleepStage {
    Deep,
    Rem,
    Asleep,
    Awake,
    InBed,
}

impl SleepStage {
    fn from_value(value: &str) -> Option<Self> {
        // "AsleepDeep" and "AsleepREM" also contain "Asleep"
        if value.contains("Deep") {
            Some(SleepStage::Deep)
        } else if value.contains("REM") {
            Some(SleepStage::Rem)
        } else if value.contains("Awake") {
            Some(SleepStage::Awake)
        } else if value.contains("InBed") {
            Some(SleepStage::InBed)
        } else if value.contains("Asleep") || value.contains("Core") {
            Some(SleepStage::Asleep)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct NightTotals {
    asleep_min: u64,
    deep_min: u64,
    rem_min: u64,
    in_bed_min: u64,
    awakenings: u32,
}

impl NightTotals {
    fn add(&mut self, stage: SleepStage, minutes: u64) {
        match stage {
            SleepStage::Deep => self.deep_min += minutes,
            SleepStage::Rem => self.rem_min += minutes,
            SleepStage::Asleep => self.asleep_min += minutes,
            SleepStage::Awake => self.awakenings = self.awakenings.saturating_add(1),
            SleepStage::InBed => self.in_bed_min += minutes,
        }
    }

    fn into_record(self, date: NaiveDate) -> Result<SleepRecord, AnalysisError> {
        if self.in_bed_min == 0 {
            return Err(AnalysisError::MissingField(format!("in-bed time ({date})")));
        }

        let total = self.asleep_min + self.deep_min + self.rem_min;
        let efficiency = (total as f64 / self.in_bed_min as f64 * 100.0).min(100.0);

        Ok(SleepRecord {
            date,
            total_sleep_min: saturating_minutes(total),
            sleep_efficiency: (efficiency * 10.0).round() / 10.0,
            deep_sleep_min: saturating_minutes(self.deep_min),
            rem_sleep_min: saturating_minutes(self.rem_min),
            awakenings: self.awakenings,
        })
    }
}

fn saturating_minutes(minutes: u64) -> u32 {
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, AnalysisError> {
    DateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| AnalysisError::DateParseError(format!("{value}: {e}")))
}

/// Apple Health `export.xml` adapter
pub struct AppleHealthXmlAdapter;

impl SleepExportAdapter for AppleHealthXmlAdapter {
    fn parse(&self, content: &str) -> Result<Vec<SleepRecord>, AnalysisError> {
        // Real exports open with an internal DOCTYPE subset
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(content, options)
            .map_err(|e| AnalysisError::ParseError(format!("invalid XML: {e}")))?;

        let mut nights: BTreeMap<NaiveDate, NightTotals> = BTreeMap::new();
        let sleep_records = doc
            .descendants()
            .filter(|n| n.has_tag_name("Record") && n.attribute("type") == Some(SLEEP_ANALYSIS));

        for node in sleep_records {
            let (Some(start), Some(end), Some(value)) = (
                node.attribute("startDate"),
                node.attribute("endDate"),
                node.attribute("value"),
            ) else {
                continue;
            };
            let Some(stage) = SleepStage::from_value(value) else {
                tracing::debug!(value, "skipping unknown sleep stage");
                continue;
            };

            let start = parse_timestamp(start)?;
            let end = parse_timestamp(end)?;
            let minutes = u64::try_from(end.signed_duration_since(start).num_minutes())
                .map_err(|_| {
                    AnalysisError::ParseError(format!("sleep interval ends before it starts ({start})"))
                })?;

            let night = (start.naive_local() + Duration::hours(NIGHT_ROLLOVER_HOURS)).date();
            nights.entry(night).or_default().add(stage, minutes);
        }

        let records = nights
            .into_iter()
            .map(|(date, totals)| totals.into_record(date))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(records = records.len(), "parsed Apple Health export");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &str, start: &str, end: &str) -> String {
        format!(
            "<Record type=\"{SLEEP_ANALYSIS}\" sourceName=\"Watch\" startDate=\"{start}\" \
             endDate=\"{end}\" value=\"HKCategoryValueSleepAnalysis{value}\"/>\n"
        )
    }

    fn export(records: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE HealthData [\n<!ELEMENT HealthData (Record)*>\n]>\n\
             <HealthData locale=\"en_US\">\n{}</HealthData>\n",
            records.concat()
        )
    }

    fn one_night() -> Vec<String> {
        vec![
            record("InBed", "2024-03-01 23:00:00 -0800", "2024-03-02 07:00:00 -0800"),
            record("AsleepCore", "2024-03-01 23:10:00 -0800", "2024-03-02 01:10:00 -0800"),
            record("AsleepDeep", "2024-03-02 01:10:00 -0800", "2024-03-02 02:40:00 -0800"),
            record("AsleepREM", "2024-03-02 02:40:00 -0800", "2024-03-02 04:20:00 -0800"),
            record("Awake", "2024-03-02 04:20:00 -0800", "2024-03-02 04:30:00 -0800"),
            record("AsleepCore", "2024-03-02 04:30:00 -0800", "2024-03-02 06:50:00 -0800"),
            record("Awake", "2024-03-02 06:50:00 -0800", "2024-03-02 07:00:00 -0800"),
        ]
    }

    #[test]
    fn test_night_is_aggregated() {
        let records = AppleHealthXmlAdapter.parse(&export(&one_night())).unwrap();
        assert_eq!(records.len(), 1);

        let night = &records[0];
        assert_eq!(night.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        // 120 core + 90 deep + 100 REM + 140 core
        assert_eq!(night.total_sleep_min, 450);
        assert_eq!(night.deep_sleep_min, 90);
        assert_eq!(night.rem_sleep_min, 100);
        assert_eq!(night.awakenings, 2);
        // 450 / 480 = 93.75%
        assert_eq!(night.sleep_efficiency, 93.8);
    }

    #[test]
    fn test_nights_are_sorted_and_other_types_ignored() {
        let mut records = vec![
            record("InBed", "2024-03-04 22:30:00 -0800", "2024-03-05 06:30:00 -0800"),
            record("Asleep", "2024-03-04 22:40:00 -0800", "2024-03-05 06:10:00 -0800"),
            "<Record type=\"HKQuantityTypeIdentifierHeartRate\" startDate=\"2024-03-04 22:40:00 -0800\" \
             endDate=\"2024-03-04 22:41:00 -0800\" value=\"58\"/>\n"
                .to_string(),
            format!("<Record type=\"{SLEEP_ANALYSIS}\" value=\"HKCategoryValueSleepAnalysisAsleepCore\"/>\n"),
        ];
        records.extend(one_night());

        let parsed = AppleHealthXmlAdapter.parse(&export(&records)).unwrap();
        let dates: Vec<NaiveDate> = parsed.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            ]
        );
        assert_eq!(parsed[1].total_sleep_min, 450);
        assert_eq!(parsed[1].awakenings, 0);
    }

    #[test]
    fn test_missing_in_bed_is_an_error() {
        let records = vec![record(
            "AsleepCore",
            "2024-03-01 23:10:00 -0800",
            "2024-03-02 06:10:00 -0800",
        )];
        let err = AppleHealthXmlAdapter.parse(&export(&records)).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingField(ref f) if f.starts_with("in-bed time")));
    }

    #[test]
    fn test_efficiency_is_capped() {
        let records = vec![
            record("InBed", "2024-03-01 23:00:00 -0800", "2024-03-02 05:00:00 -0800"),
            record("AsleepCore", "2024-03-01 23:00:00 -0800", "2024-03-02 06:00:00 -0800"),
        ];
        let parsed = AppleHealthXmlAdapter.parse(&export(&records)).unwrap();
        assert_eq!(parsed[0].sleep_efficiency, 100.0);
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(
            AppleHealthXmlAdapter.parse("<HealthData><Record"),
            Err(AnalysisError::ParseError(_))
        ));

        let bad_date = vec![record("InBed", "yesterday", "2024-03-02 07:00:00 -0800")];
        assert!(matches!(
            AppleHealthXmlAdapter.parse(&export(&bad_date)),
            Err(AnalysisError::DateParseError(_))
        ));

        let backwards = vec![record(
            "InBed",
            "2024-03-02 07:00:00 -0800",
            "2024-03-01 23:00:00 -0800",
        )];
        assert!(matches!(
            AppleHealthXmlAdapter.parse(&export(&backwards)),
            Err(AnalysisError::ParseError(_))
        ));
    }
}
