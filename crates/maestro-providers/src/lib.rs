//! Provider adapters for external text-generation backends.
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::assertions_on_result_states,
        clippy::float_cmp,
        clippy::absolute_paths,
        reason = "Allow for tests"
    )
)]

/// Groq provider implementation.
pub mod groq;
/// Scriptable provider for tests and offline runs.
pub mod mock;

pub use groq::GroqProvider;
pub use mock::MockProvider;
