//! Rolling statistics per backend (or any other named key).
//!
//! Updates are applied under the exclusive side of a reader/writer lock so
//! the running averages stay exact under concurrent callers. Readers always
//! receive owned copies.

use chrono::{DateTime, Utc};
use maestro_core::{IgnoreRwLock as _, running_average};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

/// Requests between two improvement checks.
pub const IMPROVEMENT_INTERVAL: u64 = 100;
/// Success rate a backend must exceed at a check to be marked improved.
const IMPROVEMENT_RATE: f64 = 0.85;

/// Running aggregate for one key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Completed requests
    pub total_requests: u64,
    /// Requests that succeeded
    pub successful_requests: u64,
    /// `successful_requests / total_requests`, always in `[0, 1]`
    pub success_rate: f64,
    /// Mean latency in milliseconds
    pub avg_latency_ms: f64,
    /// Mean reported confidence
    pub avg_confidence: f64,
    /// Last time an improvement check passed
    pub last_improved: Option<DateTime<Utc>>,
}

impl Stats {
    /// Folds one outcome into the aggregate.
    ///
    /// Returns `true` when this update marked the key as improved.
    fn record(&mut self, success: bool, latency: Duration, confidence: f64) -> bool {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        }
        self.success_rate = self.successful_requests as f64 / self.total_requests as f64;
        self.avg_latency_ms = running_average(
            self.avg_latency_ms,
            self.total_requests,
            latency.as_secs_f64() * 1000.0,
        );
        self.avg_confidence = running_average(self.avg_confidence, self.total_requests, confidence);

        let improved = self.total_requests % IMPROVEMENT_INTERVAL == 0
            && self.success_rate > IMPROVEMENT_RATE;
        if improved {
            self.last_improved = Some(Utc::now());
        }
        improved
    }
}

/// Concurrent-safe map of [`Stats`].
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    /// Aggregates keyed by backend or agent name
    stats: RwLock<HashMap<String, Stats>>,
}

impl PerformanceTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed execution for `key`.
    pub fn update(&self, key: &str, success: bool, latency: Duration, confidence: f64) {
        let mut stats = self.stats.write_ignore_poison();
        let entry = stats.entry(key.to_owned()).or_default();
        if entry.record(success, latency, confidence) {
            info!(
                key,
                success_rate = entry.success_rate,
                requests = entry.total_requests,
                "Backend marked as improved"
            );
        }
    }

    /// Returns a copy of the stats for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Stats> {
        self.stats.read_ignore_poison().get(key).cloned()
    }

    /// Success rate for `key`, if anything was recorded.
    #[must_use]
    pub fn success_rate(&self, key: &str) -> Option<f64> {
        self.stats
            .read_ignore_poison()
            .get(key)
            .map(|stats| stats.success_rate)
    }

    /// Drops the stats for `key`. Returns whether anything was removed.
    pub fn reset(&self, key: &str) -> bool {
        self.stats.write_ignore_poison().remove(key).is_some()
    }

    /// Drops all stats.
    pub fn reset_all(&self) {
        self.stats.write_ignore_poison().clear();
    }

    /// Copies every aggregate, ordered by key.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Stats> {
        self.stats
            .read_ignore_poison()
            .iter()
            .map(|(key, stats)| (key.clone(), stats.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const MS: Duration = Duration::from_millis(100);

    #[test]
    fn test_success_rate_from_counts() {
        let tracker = PerformanceTracker::new();
        tracker.update("m", true, MS, 0.9);
        tracker.update("m", false, MS, 0.5);
        tracker.update("m", true, MS, 0.7);

        let stats = tracker.get("m").unwrap();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.successful_requests, 2);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats.avg_confidence - 0.7).abs() < 1e-12);
        assert!((stats.avg_latency_ms - 100.0).abs() < 1e-9);
        assert!(tracker.success_rate("other").is_none());
    }

    #[test]
    fn test_identical_confidence_average() {
        let tracker = PerformanceTracker::new();
        for _ in 0..37 {
            tracker.update("m", true, MS, 0.83);
        }
        assert!((tracker.get("m").unwrap().avg_confidence - 0.83).abs() < 1e-9);
    }

    #[test]
    fn test_improvement_marking() {
        let tracker = PerformanceTracker::new();
        for index in 0..IMPROVEMENT_INTERVAL {
            tracker.update("good", index % 10 != 0, MS, 0.9);
            tracker.update("bad", index % 2 == 0, MS, 0.9);
        }
        assert!(tracker.get("good").unwrap().last_improved.is_some());
        assert!(tracker.get("bad").unwrap().last_improved.is_none());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let tracker = PerformanceTracker::new();
        tracker.update("m", true, MS, 1.0);
        let before = tracker.snapshot();
        tracker.update("m", false, MS, 0.0);

        assert_eq!(before["m"].total_requests, 1);
        assert_eq!(tracker.get("m").unwrap().total_requests, 2);
    }

    #[test]
    fn test_reset() {
        let tracker = PerformanceTracker::new();
        tracker.update("a", true, MS, 1.0);
        tracker.update("b", true, MS, 1.0);

        assert!(tracker.reset("a"));
        assert!(!tracker.reset("a"));
        assert_eq!(tracker.snapshot().len(), 1);
        tracker.reset_all();
        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let tracker = Arc::new(PerformanceTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..50 {
                        tracker.update("m", true, MS, 0.5);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = tracker.get("m").unwrap();
        assert_eq!(stats.total_requests, 400);
        assert!((stats.success_rate - 1.0).abs() < f64::EPSILON);
    }
}
