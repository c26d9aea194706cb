use chrono::{DateTime, Utc};
use maestro_core::running_average;
use serde::{Deserialize, Serialize};

use crate::result::AgentResult;

/// Running performance record for one agent type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentEvaluation {
    /// Recorded executions
    pub total_executions: u64,
    /// Executions that succeeded
    pub successful: u64,
    /// Executions that failed
    pub failed: u64,
    /// Mean confidence on the 0-10 scale
    pub avg_confidence: f64,
    /// Mean execution time in milliseconds
    pub avg_execution_ms: f64,
    /// When the last execution was recorded
    pub last_evaluated: Option<DateTime<Utc>>,
}

impl AgentEvaluation {
    /// Folds one result into the record.
    pub fn record(&mut self, result: &AgentResult) {
        self.total_executions += 1;
        if result.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.avg_confidence =
            running_average(self.avg_confidence, self.total_executions, result.confidence());
        self.avg_execution_ms = running_average(
            self.avg_execution_ms,
            self.total_executions,
            result.execution_ms as f64,
        );
        self.last_evaluated = Some(Utc::now());
    }

    /// `successful / total_executions`, zero when nothing was recorded.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.successful as f64 / self.total_executions as f64
        }
    }
}
