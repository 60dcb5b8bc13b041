//! Strategy construction for persistent components.
//!
//! The registry says whether a type is a routed page; pages get the page
//! capability, their own scope and a state container, everything else gets
//! the component capability and links to its page when it first receives
//! parameters.

use std::sync::Arc;

use cs_01_render_strategies::{Component, ComponentRenderStrategy};
use tracing::debug;

use super::composer::StateComposer;
use super::container::PageStateContainer;
use super::page_scope::{PageScope, StateEntry, StateLink};
use super::persistent_strategy::{
    ComponentStateCapability, PageStateCapability, PersistentStateExtension,
};
use crate::config::PersistenceConfig;
use crate::domain::{ComponentStateInfo, ComponentStateRegistry, NodeId};
use crate::error::StateError;
use crate::ports::{DocumentBridge, PersistentComponent};

/// Everything the persistent strategies share, built once at startup.
pub struct PersistenceServices {
    pub registry: Arc<ComponentStateRegistry>,
    pub composer: StateComposer,
    pub document: Arc<dyn DocumentBridge>,
    pub config: PersistenceConfig,
}

impl PersistenceServices {
    pub fn new(registry: ComponentStateRegistry, document: Arc<dyn DocumentBridge>) -> Self {
        Self {
            registry: Arc::new(registry),
            composer: StateComposer::new(),
            document,
            config: PersistenceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PersistenceConfig) -> Self {
        self.config = config;
        self
    }
}

pub struct RenderStrategyFactory {
    services: Arc<PersistenceServices>,
}

impl RenderStrategyFactory {
    pub fn new(services: Arc<PersistenceServices>) -> Result<Self, StateError> {
        services.config.validate()?;
        Ok(Self { services })
    }

    pub fn services(&self) -> &Arc<PersistenceServices> {
        &self.services
    }

    /// Build the strategy for a registered persistent component.
    pub fn create<C: PersistentComponent>(&self, component: Arc<C>) -> Result<PersistentRenderStrategy, StateError> {
        let info = self.services.registry.component_state_info::<C>()?;
        debug!(component = info.short_name(), page = info.is_page(), "creating persistent strategy");
        if info.is_page() {
            Ok(self.create_page(component, info))
        } else {
            Ok(self.create_component(component, info))
        }
    }

    fn create_component<C: PersistentComponent>(
        &self,
        component: Arc<C>,
        info: Arc<ComponentStateInfo>,
    ) -> PersistentRenderStrategy {
        let state = Arc::new(PersistentStateExtension::new(
            component.clone(),
            info,
            self.services.config.clone(),
            Box::new(ComponentStateCapability),
        ));
        PersistentRenderStrategy {
            strategy: ComponentRenderStrategy::with_extension(component, state.clone()),
            state,
        }
    }

    fn create_page<C: PersistentComponent>(
        &self,
        component: Arc<C>,
        info: Arc<ComponentStateInfo>,
    ) -> PersistentRenderStrategy {
        let scope = PageScope::new(StateEntry {
            component: component.clone(),
            info: Arc::clone(&info),
        });
        let container = PageStateContainer::new(
            &scope,
            self.services.composer,
            self.services.config.state_element_id.clone(),
        );
        scope.set_container(ComponentRenderStrategy::new(Arc::new(container)));

        let state = Arc::new(
            PersistentStateExtension::new(
                component.clone(),
                info,
                self.services.config.clone(),
                Box::new(PageStateCapability::new(Arc::clone(&self.services.document))),
            )
            .with_link(Arc::new(StateLink::new(scope, NodeId::ROOT))),
        );
        PersistentRenderStrategy {
            strategy: ComponentRenderStrategy::with_extension(component, state.clone()),
            state,
        }
    }
}

/// A render strategy together with its persistence state.
#[derive(Clone)]
pub struct PersistentRenderStrategy {
    strategy: Arc<ComponentRenderStrategy>,
    state: Arc<PersistentStateExtension>,
}

impl PersistentRenderStrategy {
    pub fn strategy(&self) -> &Arc<ComponentRenderStrategy> {
        &self.strategy
    }

    pub fn state(&self) -> &Arc<PersistentStateExtension> {
        &self.state
    }

    /// The strategy as the renderer sees it.
    pub fn as_component(&self) -> Arc<dyn Component> {
        self.strategy.clone()
    }

    /// The page scope this component belongs to, once linked.
    pub fn scope(&self) -> Option<Arc<PageScope>> {
        self.state.link().map(|link| Arc::clone(link.scope()))
    }
}
