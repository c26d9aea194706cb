//! Recorded chain runs, reused when choosing future chains.

use chrono::{DateTime, Utc};
use maestro_core::{IgnoreRwLock as _, TaskKind, running_average};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use uuid::Uuid;

use crate::types::AgentType;

/// One completed chain run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPattern {
    /// Chain identifier
    pub id: Uuid,
    /// Kind of the originating task
    pub task_kind: TaskKind,
    /// Agents in planned order
    pub agent_sequence: Vec<AgentType>,
    /// 1.0 when the chain succeeded, otherwise 0.0
    pub success_rate: f64,
    /// Chain wall time in milliseconds
    pub avg_duration_ms: f64,
    /// Mean step confidence
    pub confidence: f64,
    /// When the run was recorded
    pub last_updated: DateTime<Utc>,
}

/// Aggregate over every recorded run of the same sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    /// Agents in planned order
    pub agent_sequence: Vec<AgentType>,
    /// Number of recorded runs
    pub runs: usize,
    /// Fraction of runs that succeeded
    pub success_rate: f64,
    /// Mean confidence over runs
    pub confidence: f64,
    /// Mean wall time in milliseconds
    pub avg_duration_ms: f64,
}

/// Maximum number of individual runs kept for lookup by id.
pub const MAX_RECORDED_RUNS: usize = 256;

/// Store contents behind one lock so runs and summaries never disagree.
#[derive(Debug, Default)]
struct PatternState {
    /// Most recent runs, oldest first
    runs: VecDeque<WorkflowPattern>,
    /// Per task kind, one summary per distinct sequence in first-seen order
    summaries: HashMap<TaskKind, Vec<PatternSummary>>,
}

/// Concurrent-safe store of [`WorkflowPattern`]s.
///
/// Every run is folded into its sequence's [`PatternSummary`] when it is
/// recorded. Only the latest [`MAX_RECORDED_RUNS`] runs are retained
/// individually.
#[derive(Debug, Default)]
pub struct PatternStore {
    state: RwLock<PatternState>,
}

impl PatternStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a run into its sequence summary and retains it for lookup.
    pub fn record(&self, pattern: WorkflowPattern) {
        let mut state = self.state.write_ignore_poison();

        let summaries = state.summaries.entry(pattern.task_kind).or_default();
        let position = summaries
            .iter()
            .position(|summary| summary.agent_sequence == pattern.agent_sequence);
        let summary = if let Some(index) = position {
            &mut summaries[index]
        } else {
            summaries.push(PatternSummary {
                agent_sequence: pattern.agent_sequence.clone(),
                runs: 0,
                success_rate: 0.0,
                confidence: 0.0,
                avg_duration_ms: 0.0,
            });
            let last = summaries.len() - 1;
            &mut summaries[last]
        };
        summary.runs += 1;
        let runs = summary.runs as u64;
        summary.success_rate = running_average(summary.success_rate, runs, pattern.success_rate);
        summary.confidence = running_average(summary.confidence, runs, pattern.confidence);
        summary.avg_duration_ms =
            running_average(summary.avg_duration_ms, runs, pattern.avg_duration_ms);

        if state.runs.len() == MAX_RECORDED_RUNS {
            state.runs.pop_front();
        }
        state.runs.push_back(pattern);
    }

    /// Looks up a retained run by chain id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<WorkflowPattern> {
        self.state
            .read_ignore_poison()
            .runs
            .iter()
            .find(|pattern| pattern.id == id)
            .cloned()
    }

    /// Retained runs for a task kind, oldest first.
    #[must_use]
    pub fn for_task_kind(&self, task_kind: TaskKind) -> Vec<WorkflowPattern> {
        self.state
            .read_ignore_poison()
            .runs
            .iter()
            .filter(|pattern| pattern.task_kind == task_kind)
            .cloned()
            .collect()
    }

    /// Best sequence for a task kind: highest success rate, then highest confidence.
    ///
    /// Summaries cover every run ever recorded, including runs no longer
    /// retained individually.
    #[must_use]
    pub fn best_for(&self, task_kind: TaskKind) -> Option<PatternSummary> {
        self.state
            .read_ignore_poison()
            .summaries
            .get(&task_kind)?
            .iter()
            .max_by(|left, right| {
                left.success_rate
                    .total_cmp(&right.success_rate)
                    .then(left.confidence.total_cmp(&right.confidence))
            })
            .cloned()
    }

    /// Number of retained runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read_ignore_poison().runs.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read_ignore_poison().runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sequence: &[AgentType], success: bool, confidence: f64) -> WorkflowPattern {
        WorkflowPattern {
            id: Uuid::new_v4(),
            task_kind: TaskKind::Code,
            agent_sequence: sequence.to_vec(),
            success_rate: if success { 1.0 } else { 0.0 },
            avg_duration_ms: 100.0,
            confidence,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_best_prefers_success_then_confidence() {
        let store = PatternStore::new();
        let short = [AgentType::Development];
        let long = [AgentType::Analysis, AgentType::Development];
        let review = [AgentType::Development, AgentType::Quality];

        store.record(run(&short, true, 6.0));
        store.record(run(&short, false, 6.0));
        store.record(run(&long, true, 7.0));
        store.record(run(&review, true, 9.0));

        let best = store.best_for(TaskKind::Code).unwrap();
        assert_eq!(best.agent_sequence, review.to_vec());
        assert_eq!(best.runs, 1);
        assert!(store.best_for(TaskKind::Chat).is_none());
        assert_eq!(store.for_task_kind(TaskKind::Code).len(), 4);
    }

    #[test]
    fn test_group_averages() {
        let store = PatternStore::new();
        let sequence = [AgentType::Analysis];
        store.record(run(&sequence, true, 8.0));
        store.record(run(&sequence, false, 4.0));

        let best = store.best_for(TaskKind::Code).unwrap();
        assert_eq!(best.runs, 2);
        assert!((best.success_rate - 0.5).abs() < 1e-9);
        assert!((best.confidence - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_and_get() {
        let store = PatternStore::new();
        assert!(store.is_empty());
        let pattern = run(&[AgentType::Quality], true, 5.0);
        let id = pattern.id;
        store.record(pattern);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().agent_sequence, vec![AgentType::Quality]);
    }

    #[test]
    fn test_retained_runs_are_bounded() {
        let store = PatternStore::new();
        let sequence = [AgentType::Analysis, AgentType::Quality];
        let first = run(&sequence, false, 2.0);
        let first_id = first.id;
        store.record(first);
        for _ in 0..MAX_RECORDED_RUNS + 9 {
            store.record(run(&sequence, true, 8.0));
        }

        assert_eq!(store.len(), MAX_RECORDED_RUNS);
        assert!(store.get(first_id).is_none());
        assert_eq!(store.for_task_kind(TaskKind::Code).len(), MAX_RECORDED_RUNS);

        let best = store.best_for(TaskKind::Code).unwrap();
        assert_eq!(best.runs, MAX_RECORDED_RUNS + 10);
        assert!(best.success_rate < 1.0);
    }
}
