//! # State Telemetry
//!
//! Structured logging for hosts embedding the render strategies.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use state_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     init_logging(&TelemetryConfig::from_env()).expect("logging");
//!     // Lifecycle transitions, restore decisions and composer output
//!     // are now emitted as tracing events.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CS_SERVICE_NAME` | `component-state` | Service name reported when logging starts |
//! | `CS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CS_JSON_LOGS` | `false` | JSON output instead of human-readable lines |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};

use thiserror::Error;

/// Failure to install logging.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install the global subscriber: {0}")]
    SubscriberInit(String),
}
