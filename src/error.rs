//! Error types for rxflow
//!
//! Construction problems and programmer errors are returned as `Err`.
//! Failures that happen while values are flowing are turned into
//! `done` or `warn` signals by the operator that observed them.

use std::time::Duration;

/// Main error type for rxflow operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RxError {
    /// `set`, `signal` or `on` was called on a stream that has been disposed
    #[error("stream '{label}' is disposed ({reason})")]
    Disposed { label: String, reason: String },

    /// The source resolver was handed a shape it cannot turn into a stream
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    /// Option values that can never work, caught at setup
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A positional write outside the current bounds
    #[error("index {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// A user-supplied function failed
    #[error("operator failed: {0}")]
    Operator(String),

    /// A read, wait or watchdog elapsed
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The operation was cancelled through an abort signal
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl RxError {
    pub(crate) fn disposed(label: &str, reason: &str) -> Self {
        RxError::Disposed {
            label: label.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for rxflow operations
pub type RxResult<T> = Result<T, RxError>;
