//! Persistence configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::StateError;

pub const DEFAULT_ROOT_RESTORE_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_STATE_ELEMENT_ID: &str = "page-state";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// How long a descendant waits for the page root to finish restoring
    pub root_restore_timeout: Duration,

    /// Id of the element carrying the encoded page state
    pub state_element_id: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            root_restore_timeout: DEFAULT_ROOT_RESTORE_TIMEOUT,
            state_element_id: DEFAULT_STATE_ELEMENT_ID.to_string(),
        }
    }
}

impl PersistenceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CS_ROOT_RESTORE_TIMEOUT_MS`: Root restoration wait in milliseconds (default: 5000)
    /// - `CS_STATE_ELEMENT_ID`: Page state element id (default: page-state)
    pub fn from_env() -> Self {
        Self {
            root_restore_timeout: env::var("CS_ROOT_RESTORE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_ROOT_RESTORE_TIMEOUT),

            state_element_id: env::var("CS_STATE_ELEMENT_ID")
                .unwrap_or_else(|_| DEFAULT_STATE_ELEMENT_ID.to_string()),
        }
    }

    pub fn with_root_restore_timeout(mut self, timeout: Duration) -> Self {
        self.root_restore_timeout = timeout;
        self
    }

    pub fn with_state_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.state_element_id = element_id.into();
        self
    }

    pub fn validate(&self) -> Result<(), StateError> {
        if self.root_restore_timeout.is_zero() {
            return Err(StateError::InvalidConfiguration(
                "root restore timeout must be greater than zero".to_string(),
            ));
        }
        let id = &self.state_element_id;
        if id.trim().is_empty() || id.contains(|c: char| c == '"' || c.is_whitespace()) {
            return Err(StateError::InvalidConfiguration(format!(
                "'{id}' is not a usable element id"
            )));
        }
        Ok(())
    }
}
