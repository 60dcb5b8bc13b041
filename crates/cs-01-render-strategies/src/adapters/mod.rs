//! Adapters: in-memory implementations of the host ports.

pub mod memory_renderer;

pub use memory_renderer::{ComponentId, InMemoryRenderer};
