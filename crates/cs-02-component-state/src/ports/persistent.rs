use std::any::Any;

use async_trait::async_trait;
use cs_01_render_strategies::{LifecycleError, StrategyRenderedComponent};

use crate::domain::StateMembers;

/// Object-safe access to the concrete component behind a trait object.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A component whose state members survive from the prerender pass into
/// the interactive pass.
///
/// State members are declared once per type in [`describe_state`](Self::describe_state)
/// and registered at startup with
/// [`ComponentStateRegistry`](crate::ComponentStateRegistry).
///
/// On the interactive pass a component whose state was restored skips
/// [`initialize_state`](Self::initialize_state) and gets
/// [`on_state_restored`](Self::on_state_restored) instead.
#[async_trait]
pub trait PersistentComponent: StrategyRenderedComponent + AsAny {
    fn describe_state(_members: &mut StateMembers<Self>)
    where
        Self: Sized,
    {
    }

    /// Explicit position id among siblings. Required when two siblings share a type.
    fn state_id(&self) -> Option<String> {
        None
    }

    /// Produce state from scratch (no persisted state available).
    fn initialize_state(&self) {}

    async fn initialize_state_async(&self) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn on_state_restored(&self) {}
}
