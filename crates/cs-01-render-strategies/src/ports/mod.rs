//! Ports: the seams between a strategy, its component and the hosting renderer.

pub mod component;
pub mod host;

pub use component::{Component, StrategyRenderedComponent};
pub use host::RenderHandle;
