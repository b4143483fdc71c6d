use thiserror::Error;

/// Unified error type for dispatch decision processing.
///
/// Leaf components (scorer, estimator, assessor) return explicit outcomes
/// instead of errors; these variants are raised by event validation and the
/// engine's invariant checks.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Stale data: {0}")]
    StaleData(String),

    #[error("No eligible resource: {0}")]
    NoEligibleResource(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Event processing error: {0}")]
    Processing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
