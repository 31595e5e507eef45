//! Error types for the spatial layout engine.

use thiserror::Error;

#[derive(Error, Debug)]
/// Failures surfaced by layout facet operations.
pub enum LayoutError {
    /// A geometric input was NaN, infinite, negative, or otherwise outside
    /// its domain.
    #[error("layout {op}: invalid input: {reason}")]
    InvalidInput { op: &'static str, reason: String },

    /// A layout violates one of its size constraints.
    #[error("layout {op}: component `{target}` violates {constraint}: {reason}")]
    ConstraintViolation {
        op: &'static str,
        target: String,
        constraint: &'static str,
        reason: String,
    },

    /// An animation progress value fell outside `[0, 1]`.
    #[error("layout {op}: progress {value} outside [0, 1]")]
    InvalidProgress { op: &'static str, value: f64 },
}

impl LayoutError {
    pub(crate) fn invalid_input(op: &'static str, reason: impl Into<String>) -> Self {
        LayoutError::InvalidInput {
            op,
            reason: reason.into(),
        }
    }
}
