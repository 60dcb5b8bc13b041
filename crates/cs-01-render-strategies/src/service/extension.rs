//! Strategy extension seam.
//!
//! [`ComponentRenderStrategy`](super::ComponentRenderStrategy) runs the
//! lifecycle; an extension adds behaviour at fixed points of it without
//! re-implementing the sequence.

use async_trait::async_trait;

use crate::domain::{ParameterView, RenderFragment, RenderTreeBuilder, RendererInfo};
use crate::error::LifecycleError;

#[async_trait]
pub trait StrategyExtension: Send + Sync {
    /// Called once the strategy is attached to a renderer.
    fn attached(&self, _renderer: &RendererInfo) {}

    /// Called with every parameter set, after the component copied its
    /// parameters and before any lifecycle hook runs.
    fn parameters_received(&self, _parameters: &ParameterView) -> Result<(), LifecycleError> {
        Ok(())
    }

    /// Runs first on the one-time initialization path.
    async fn before_initialize(&self, _renderer: &RendererInfo) -> Result<(), LifecycleError> {
        Ok(())
    }

    /// Called once when the strategy is disposed, before the component's
    /// own dispose hook.
    fn disposed(&self) {}

    /// Emit the component's output. `content` renders the component itself.
    fn build_render_tree(&self, builder: &mut RenderTreeBuilder, content: &RenderFragment) {
        content.render(builder);
    }
}

/// Plain lifecycle with no additions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtension;

impl StrategyExtension for DefaultExtension {}
