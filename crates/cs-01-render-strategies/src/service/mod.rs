//! Service layer: the lifecycle engine and its extension seam.

pub mod extension;
pub mod strategy;

pub use extension::{DefaultExtension, StrategyExtension};
pub use strategy::{ComponentRenderStrategy, RenderWrapper};
