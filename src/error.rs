//! Typed failures for aggregate resolution.
//!
//! Callers match on these to tell a programming error (bad scope) apart from
//! bad input data (a misordered run mode in the mapping file).
use thiserror::Error;

/// Fatal conditions raised by [`crate::aggregate::Resolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// No roles were requested, so there is nothing to aggregate.
    #[error("invalid scope: at least one service role is required")]
    InvalidScope,

    /// A run mode was written stage-first.
    #[error("invalid run mode {run_mode:?}: use {corrected:?} instead")]
    MisorderedRunMode { run_mode: String, corrected: String },
}

impl AggregateError {
    /// Whether the failure stems from the input data rather than the caller.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AggregateError::MisorderedRunMode { .. })
    }
}
