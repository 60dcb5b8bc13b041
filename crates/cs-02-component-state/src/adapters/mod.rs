//! Adapters: in-memory implementations of the ports.

pub mod memory_document;

pub use memory_document::InMemoryDocument;
