use maestro_core::TaskKind;
use std::result::Result as StdResult;
use thiserror::Error;

/// Result type for routing operations.
pub type Result<T> = StdResult<T, RoutingError>;

/// Errors produced while selecting a backend.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Every model in the catalog violated a hard constraint.
    #[error(
        "No compatible model for {task} task ({input_tokens} input tokens, function calls: {needs_function_calls}, embedding: {needs_embedding})"
    )]
    NoCompatibleModel {
        /// Requested task kind
        task: TaskKind,
        /// Input size that had to fit
        input_tokens: usize,
        /// Whether structured function calls were required
        needs_function_calls: bool,
        /// Whether embedding support was required
        needs_embedding: bool,
    },

    /// The named model is not in the catalog.
    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

impl RoutingError {
    /// Whether relaxing the request constraints could make routing succeed.
    #[must_use]
    pub fn is_constraint_exhaustion(&self) -> bool {
        matches!(self, Self::NoCompatibleModel { .. })
    }
}
