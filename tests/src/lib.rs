//! # Component-State Test Suite
//!
//! Cross-crate flows driven through the in-memory renderer.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs     # Shared page and component fixtures
//!     ├── round_trip.rs   # Prerender → interactive restoration
//!     ├── fallback.rs     # Missing blob, missing nodes, root timeouts
//!     └── lifecycle.rs    # Prerequisites and events around persistence
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cs-tests
//! cargo test -p cs-tests integration::round_trip::
//! ```

pub mod integration;
