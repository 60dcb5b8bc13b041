//! Error types for component state persistence

use cs_01_render_strategies::{LifecycleError, TimeoutError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Component type {0} is not registered for state persistence")]
    UnregisteredComponent(String),

    #[error("Duplicate state position '{id}' under {parent}; give sibling components distinct state ids")]
    DuplicatePositionIdentifier { parent: String, id: String },

    #[error("Invalid position identifier: an explicit state id must not be blank")]
    InvalidPositionIdentifier,

    #[error("Failed to decode page state: {0}")]
    Decode(String),

    #[error("Malformed page state: {0}")]
    MalformedState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("State member '{member}' of {component} could not be converted: {reason}")]
    MemberType {
        component: String,
        member: String,
        reason: String,
    },

    #[error("Document bridge error: {0}")]
    Bridge(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl StateError {
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}

impl From<StateError> for LifecycleError {
    fn from(error: StateError) -> Self {
        match error {
            StateError::Timeout(timeout) => LifecycleError::Timeout(timeout),
            StateError::InvalidOperation(message) => LifecycleError::InvalidOperation(message),
            StateError::Lifecycle(inner) => inner,
            other => LifecycleError::extension(other),
        }
    }
}
