//! Result storage
//!
//! The analyzer is stateless. Callers that want to reuse results across
//! requests wrap it with a [`ResultStore`] of their choosing; an in-memory
//! implementation with per-entry expiry is provided.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::analyzer::SleepAnalyzer;
use crate::error::AnalysisError;
use crate::types::{SleepAnalysisResult, SleepRecord};

/// Key-value store for analysis results
pub trait ResultStore {
    /// Fetch a live entry
    fn get(&self, key: &str) -> Option<SleepAnalysisResult>;

    /// Insert or replace an entry; `None` keeps it until removed
    fn set(&mut self, key: &str, result: SleepAnalysisResult, ttl: Option<Duration>);

    /// Drop an entry, returning whether one was present
    fn remove(&mut self, key: &str) -> bool;

    /// Number of stored entries, including any not yet purged
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct StoreEntry {
    result: SleepAnalysisResult,
    expires_at: Option<Instant>,
}

impl StoreEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// Process-local store; entries past their TTL are invisible to `get`
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    entries: HashMap<String, StoreEntry>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - self.entries.len();
        if purged > 0 {
            debug!(purged, "purged expired results");
        }
        purged
    }
}

impl ResultStore for InMemoryResultStore {
    fn get(&self, key: &str) -> Option<SleepAnalysisResult> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.result.clone())
    }

    fn set(&mut self, key: &str, result: SleepAnalysisResult, ttl: Option<Duration>) {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .insert(key.to_string(), StoreEntry { result, expires_at });
    }

    fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Return the stored result for `key`, or analyze and store it
///
/// Errors are returned unchanged and nothing is stored for them.
pub fn analyze_cached<S: ResultStore + ?Sized>(
    analyzer: &SleepAnalyzer,
    store: &mut S,
    key: &str,
    records: &[SleepRecord],
    ttl: Option<Duration>,
) -> Result<SleepAnalysisResult, AnalysisError> {
    if let Some(hit) = store.get(key) {
        debug!(key, "result store hit");
        return Ok(hit);
    }

    let result = analyzer.analyze(records)?;
    store.set(key, result.clone(), ttl);
    debug!(key, "stored analysis result");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as DateDuration, NaiveDate};

    fn records(days: i64, deep: u32) -> Vec<SleepRecord> {
        (0..days)
            .map(|d| SleepRecord {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + DateDuration::days(d),
                total_sleep_min: 450 + (d % 3) as u32 * 10,
                sleep_efficiency: 90.0,
                deep_sleep_min: deep + (d % 2) as u32,
                rem_sleep_min: 100,
                awakenings: 2,
            })
            .collect()
    }

    #[test]
    fn test_miss_then_hit() {
        let analyzer = SleepAnalyzer::new();
        let mut store = InMemoryResultStore::new();

        let first = analyze_cached(&analyzer, &mut store, "user-1", &records(20, 90), None).unwrap();
        assert_eq!(store.len(), 1);

        // Different records under the same key still return the stored result
        let second = analyze_cached(&analyzer, &mut store, "user-1", &records(20, 60), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_errors_not_stored() {
        let analyzer = SleepAnalyzer::new();
        let mut store = InMemoryResultStore::new();
        let err = analyze_cached(&analyzer, &mut store, "short", &records(5, 90), None).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_entries_hidden_and_purged() {
        let result = SleepAnalyzer::new().analyze(&records(14, 90)).unwrap();
        let mut store = InMemoryResultStore::new();

        store.set("gone", result.clone(), Some(Duration::ZERO));
        store.set("kept", result.clone(), Some(Duration::from_secs(3600)));
        store.set("forever", result, None);

        assert!(store.get("gone").is_none());
        assert!(store.get("kept").is_some());
        assert_eq!(store.len(), 3);

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("forever").is_some());
    }

    #[test]
    fn test_remove() {
        let result = SleepAnalyzer::new().analyze(&records(14, 90)).unwrap();
        let mut store = InMemoryResultStore::new();
        store.set("k", result, None);
        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert!(store.get("k").is_none());
    }
}
