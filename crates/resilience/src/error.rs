// crates/resilience/src/error.rs
//! Error types for resilience operations

use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors that can occur in resilience operations
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Operation was cancelled
    #[error("Operation was cancelled")]
    Cancelled,

    /// Blocking task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ResilienceError {
    /// True when the caller stopped waiting rather than the work failing
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Cancelled)
    }
}
