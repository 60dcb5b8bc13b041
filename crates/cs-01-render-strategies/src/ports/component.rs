//! Component-facing ports.

use std::sync::Arc;

use async_trait::async_trait;

use super::host::RenderHandle;
use crate::domain::{ParameterView, PrerequisiteCollection, RenderTreeBuilder};
use crate::error::LifecycleError;

/// The surface a renderer drives for every component it hosts.
///
/// Renderers attach exactly once, then push parameters and after-render
/// notifications. [`ComponentRenderStrategy`](crate::ComponentRenderStrategy)
/// is the standard implementation.
#[async_trait]
pub trait Component: Send + Sync {
    fn attach(&self, handle: Arc<dyn RenderHandle>) -> Result<(), LifecycleError>;

    async fn set_parameters(&self, parameters: ParameterView) -> Result<(), LifecycleError>;

    async fn on_after_render(&self) -> Result<(), LifecycleError>;

    /// The component left the render tree for good. Hosts call this at most
    /// once per mount.
    fn dispose(&self) {}

    /// Diagnostic name used in logs and debug output.
    fn component_name(&self) -> &str;
}

/// Lifecycle hooks of a component whose lifecycle is sequenced by a render
/// strategy.
///
/// Every hook has a no-op default. Hooks take `&self`; components keep
/// mutable state behind their own locks or atomics.
#[async_trait]
pub trait StrategyRenderedComponent: Send + Sync {
    /// Copy incoming parameters into the component's own fields.
    fn set_parameter_properties(&self, _parameters: &ParameterView) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn prerequisites(&self) -> Option<&PrerequisiteCollection> {
        None
    }

    /// When the on-initialized phase goes asynchronous the strategy renders
    /// an intermediate state, unless this returns true.
    fn should_wait_for_complete_initialization(&self) -> bool {
        false
    }

    fn initialize(&self) {}

    async fn initialize_async(&self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn on_initialized(&self) {}

    async fn on_initialized_async(&self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn on_parameters_set(&self) {}

    async fn on_parameters_set_async(&self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn should_render(&self) -> bool {
        true
    }

    fn build_render_tree(&self, _builder: &mut RenderTreeBuilder) {}

    fn on_after_render(&self, _first_render: bool) {}

    async fn on_after_render_async(&self, _first_render: bool) -> Result<(), LifecycleError> {
        Ok(())
    }

    /// Release resources once removed from the render tree.
    fn dispose(&self) {}

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
