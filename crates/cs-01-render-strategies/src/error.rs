//! Error types for the render strategy layer

use std::time::Duration;
use thiserror::Error;

/// A bounded wait expired before its condition was met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} did not complete within {timeout:?}")]
pub struct TimeoutError {
    /// What was being waited on
    pub operation: String,
    /// The bound that expired
    pub timeout: Duration,
}

impl TimeoutError {
    pub fn new(operation: impl Into<String>, timeout: Duration) -> Self {
        Self {
            operation: operation.into(),
            timeout,
        }
    }
}

/// Errors raised while driving a component lifecycle
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Operation was canceled")]
    Canceled,

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Component failed: {0}")]
    Component(String),

    #[error(transparent)]
    Extension(Box<dyn std::error::Error + Send + Sync>),
}

impl LifecycleError {
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Wrap an error raised by a strategy extension.
    pub fn extension(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Extension(Box::new(error))
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// How an awaited lifecycle task finished once cancellation is set aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Canceled,
}

/// Swallow cancellation, keep every other failure.
pub fn ignore_cancellation(result: Result<(), LifecycleError>) -> Result<TaskOutcome, LifecycleError> {
    match result {
        Ok(()) => Ok(TaskOutcome::Completed),
        Err(error) if error.is_cancellation() => Ok(TaskOutcome::Canceled),
        Err(error) => Err(error),
    }
}
