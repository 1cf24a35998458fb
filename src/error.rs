//! Error types for vectorized expression evaluation.

use arrow::error::ArrowError;
use thiserror::Error;

/// Result type alias using [`VexprError`].
pub type Result<T> = std::result::Result<T, VexprError>;

/// Error types for expression evaluation.
///
/// Every variant is fatal to the batch call that produced it: the output
/// column is left in an unspecified state and must be discarded.
#[derive(Debug, Error)]
pub enum VexprError {
    /// A sub-expression could not compute its column or value.
    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    /// The buffer pool could not produce a scratch column.
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    /// The batch entry point was invoked on a signature that only supports
    /// row-at-a-time evaluation.
    #[error("Not implemented: vectorized evaluation of {0}")]
    NotVectorized(String),

    /// Eval-type mismatch between an expression and the requested entry point.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// Malformed function arguments (arity, search mode, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Column reference outside the batch schema.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Entry point the expression does not offer.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Arrow import/export failure.
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl VexprError {
    /// Returns true if the caller should retry this expression in row mode.
    #[must_use]
    pub fn is_not_vectorized(&self) -> bool {
        matches!(self, VexprError::NotVectorized(_))
    }

    /// Returns true if the error came from the buffer pool.
    #[must_use]
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, VexprError::AllocationFailed(_))
    }
}
