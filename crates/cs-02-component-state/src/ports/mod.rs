//! Ports: the persistent component surface and the document bridge.

pub mod document;
pub mod persistent;

pub use document::DocumentBridge;
pub use persistent::{AsAny, PersistentComponent};
