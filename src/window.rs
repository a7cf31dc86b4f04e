//! Record ordering and windowing
//!
//! Records are sorted chronologically, then two trailing windows are taken:
//! the baseline window (last ≤30 nights) and the recent window (last ≤7).
//! Both borrow from the sorted history; nothing is copied.

use std::cmp::Ordering;

use crate::config::WindowConfig;
use crate::types::SleepRecord;

/// Sort records by date into a fresh vector; the input is left untouched
///
/// Records sharing a date are ordered by their remaining fields so the
/// result does not depend on input order.
pub fn sort_chronologically(records: &[SleepRecord]) -> Vec<SleepRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(compare_records);
    sorted
}

fn compare_records(a: &SleepRecord, b: &SleepRecord) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.total_sleep_min.cmp(&b.total_sleep_min))
        .then_with(|| a.sleep_efficiency.total_cmp(&b.sleep_efficiency))
        .then_with(|| a.deep_sleep_min.cmp(&b.deep_sleep_min))
        .then_with(|| a.rem_sleep_min.cmp(&b.rem_sleep_min))
        .then_with(|| a.awakenings.cmp(&b.awakenings))
}

/// Trailing windows over a chronologically sorted history
#[derive(Debug, Clone, Copy)]
pub struct AnalysisWindows<'a> {
    /// Entire supplied history
    pub history: &'a [SleepRecord],
    /// Last min(baseline_days, N) records
    pub baseline: &'a [SleepRecord],
    /// Last min(recent_days, N) records
    pub recent: &'a [SleepRecord],
}

impl<'a> AnalysisWindows<'a> {
    /// Select windows from an already sorted history
    pub fn select(sorted: &'a [SleepRecord], config: &WindowConfig) -> Self {
        Self {
            history: sorted,
            baseline: tail(sorted, config.baseline_days),
            recent: tail(sorted, config.recent_days),
        }
    }
}

/// Last `n` elements, or all of them when fewer exist
pub fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn night(offset: i64, total: u32) -> SleepRecord {
        SleepRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset),
            total_sleep_min: total,
            sleep_efficiency: 90.0,
            deep_sleep_min: 90,
            rem_sleep_min: 100,
            awakenings: 2,
        }
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let input = vec![night(2, 400), night(0, 420), night(1, 410)];
        let sorted = sort_chronologically(&input);
        assert_eq!(input[0].total_sleep_min, 400);
        let totals: Vec<u32> = sorted.iter().map(|r| r.total_sleep_min).collect();
        assert_eq!(totals, vec![420, 410, 400]);
    }

    #[test]
    fn test_duplicate_dates_sort_deterministically() {
        let a = vec![night(0, 450), night(0, 430), night(1, 400)];
        let b = vec![night(1, 400), night(0, 430), night(0, 450)];
        assert_eq!(sort_chronologically(&a), sort_chronologically(&b));
    }

    #[test]
    fn test_window_selection_long_history() {
        let records: Vec<_> = (0..45).map(|d| night(d, 400 + d as u32)).collect();
        let windows = AnalysisWindows::select(&records, &WindowConfig::default());
        assert_eq!(windows.history.len(), 45);
        assert_eq!(windows.baseline.len(), 30);
        assert_eq!(windows.recent.len(), 7);
        assert_eq!(windows.baseline[0].total_sleep_min, 415);
        assert_eq!(windows.recent[6].total_sleep_min, 444);
    }

    #[test]
    fn test_window_selection_short_history() {
        let records: Vec<_> = (0..5).map(|d| night(d, 400)).collect();
        let windows = AnalysisWindows::select(&records, &WindowConfig::default());
        assert_eq!(windows.baseline.len(), 5);
        assert_eq!(windows.recent.len(), 5);
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail(&[1, 2, 3], 2), &[2, 3]);
        assert_eq!(tail(&[1, 2, 3], 10), &[1, 2, 3]);
        assert!(tail::<i32>(&[], 3).is_empty());
    }
}
