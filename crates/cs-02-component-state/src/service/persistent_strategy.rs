//! State persistence on top of the base lifecycle engine.
//!
//! [`PersistentStateExtension`] plugs into
//! [`ComponentRenderStrategy`](cs_01_render_strategies::ComponentRenderStrategy)
//! and replaces plain initialization with restore-or-initialize. What
//! "restore" means and how the subtree is scoped differs between a page
//! root and the components under it; that difference is a [`StateCapability`]:
//!
//! - [`ComponentStateCapability`]: waits for the page root, then looks up
//!   its own node by position path.
//! - [`PageStateCapability`]: reads the blob from the document, exposes the
//!   parsed tree to descendants and, on the prerender pass, mounts the
//!   state container.
//!
//! ## Restore Flow (interactive pass)
//!
//! ```text
//! page root                              descendant
//! ─────────                              ──────────
//! element_text(id) ──→ parse blob        wait_for_restore ─┐
//! apply root members                                       │
//! report Restored / Failed ────────────────────────────────┘
//!                                        Restored → lookup path → apply
//!                                        Failed   → initialize_state
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use cs_01_render_strategies::{
    CascadingValue, LifecycleError, ParameterView, RenderFragment, RenderTreeBuilder, RendererInfo,
    StrategyExtension, CHILD_CONTENT,
};
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace, warn};

use super::page_scope::{PageScope, StateEntry, StateLink, STATE_PARENT_CASCADE, STATE_ROOT_CASCADE};
use crate::config::PersistenceConfig;
use crate::domain::{find_property, ComponentStateInfo, PageState, PositionIdentifier, RestoreStatus};
use crate::error::StateError;
use crate::ports::{DocumentBridge, PersistentComponent};

/// How a persistent component restores its state and scopes its subtree.
#[async_trait]
pub trait StateCapability: Send + Sync {
    fn attached(&self, _renderer: &RendererInfo) {}

    /// This component's persisted properties; `Ok(None)` is a miss and
    /// leads to normal initialization.
    async fn try_restore(
        &self,
        link: &Arc<StateLink>,
        config: &PersistenceConfig,
    ) -> Result<Option<Map<String, Value>>, StateError>;

    fn build_scoped_subtree(
        &self,
        link: Option<&Arc<StateLink>>,
        builder: &mut RenderTreeBuilder,
        content: &RenderFragment,
    );
}

// =============================================================================
// Component capability
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentStateCapability;

#[async_trait]
impl StateCapability for ComponentStateCapability {
    async fn try_restore(
        &self,
        link: &Arc<StateLink>,
        config: &PersistenceConfig,
    ) -> Result<Option<Map<String, Value>>, StateError> {
        let scope = link.scope();
        let status = scope.wait_for_restore(config.root_restore_timeout).await?;
        if status != RestoreStatus::Restored {
            debug!(?status, "page state unavailable");
            return Ok(None);
        }

        let path = link.path();
        let properties = scope
            .page_state()
            .and_then(|state| state.get_component_state(path.as_slice()))
            .cloned();
        if properties.is_none() {
            debug!(?path, "no persisted node at path");
        }
        Ok(properties)
    }

    fn build_scoped_subtree(
        &self,
        link: Option<&Arc<StateLink>>,
        builder: &mut RenderTreeBuilder,
        content: &RenderFragment,
    ) {
        match link {
            Some(link) => {
                let parent: CascadingValue = Arc::clone(link) as CascadingValue;
                builder.add_cascading_value(STATE_PARENT_CASCADE, parent, |b| content.render(b));
            }
            None => content.render(builder),
        }
    }
}

// =============================================================================
// Page capability
// =============================================================================

pub struct PageStateCapability {
    document: Arc<dyn DocumentBridge>,
    persist: AtomicBool,
}

impl PageStateCapability {
    pub fn new(document: Arc<dyn DocumentBridge>) -> Self {
        Self {
            document,
            persist: AtomicBool::new(false),
        }
    }

    /// True when this pass emits the state blob.
    pub fn persists(&self) -> bool {
        self.persist.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateCapability for PageStateCapability {
    fn attached(&self, renderer: &RendererInfo) {
        let persist = !renderer.is_interactive;
        self.persist.store(persist, Ordering::SeqCst);
        debug!(renderer = %renderer, persist, "page persistence decided");
    }

    async fn try_restore(
        &self,
        link: &Arc<StateLink>,
        config: &PersistenceConfig,
    ) -> Result<Option<Map<String, Value>>, StateError> {
        let element_id = &config.state_element_id;
        let Some(encoded) = self.document.element_text(element_id).await? else {
            warn!(%element_id, "page state element not found; components initialize normally");
            return Ok(None);
        };

        let state = PageState::from_base64(&encoded)?;
        let root = state.root().properties().clone();
        link.scope().set_page_state(state)?;
        Ok(Some(root))
    }

    fn build_scoped_subtree(
        &self,
        link: Option<&Arc<StateLink>>,
        builder: &mut RenderTreeBuilder,
        content: &RenderFragment,
    ) {
        let Some(link) = link else {
            content.render(builder);
            return;
        };
        let scope = link.scope();
        let container = scope.container().filter(|_| self.persists());
        let parent: CascadingValue = Arc::clone(link) as CascadingValue;

        builder.add_cascading_value(STATE_ROOT_CASCADE, scope.as_cascade(), |b| {
            b.add_cascading_value(STATE_PARENT_CASCADE, parent, |b| match container {
                Some(container) => {
                    let parameters = ParameterView::new().with_fragment(CHILD_CONTENT, content.clone());
                    b.add_component(container, parameters);
                }
                None => content.render(b),
            });
        });
    }
}

// =============================================================================
// Extension
// =============================================================================

/// Restore-or-initialize for one persistent component.
pub struct PersistentStateExtension {
    component: Arc<dyn PersistentComponent>,
    info: Arc<ComponentStateInfo>,
    config: PersistenceConfig,
    capability: Box<dyn StateCapability>,
    link: OnceLock<Arc<StateLink>>,
    state_initialized: AtomicBool,
    state_restored: AtomicBool,
}

impl PersistentStateExtension {
    pub fn new(
        component: Arc<dyn PersistentComponent>,
        info: Arc<ComponentStateInfo>,
        config: PersistenceConfig,
        capability: Box<dyn StateCapability>,
    ) -> Self {
        Self {
            component,
            info,
            config,
            capability,
            link: OnceLock::new(),
            state_initialized: AtomicBool::new(false),
            state_restored: AtomicBool::new(false),
        }
    }

    /// Pin this component to a node up front (page roots).
    pub(crate) fn with_link(self, link: Arc<StateLink>) -> Self {
        let _ = self.link.set(link);
        self
    }

    pub fn link(&self) -> Option<&Arc<StateLink>> {
        self.link.get()
    }

    pub fn is_state_restored(&self) -> bool {
        self.state_restored.load(Ordering::SeqCst)
    }

    pub fn is_state_initialized(&self) -> bool {
        self.state_initialized.load(Ordering::SeqCst)
    }

    /// Produce state from scratch, then refresh the page's state container.
    pub async fn initialize_state(&self) -> Result<(), StateError> {
        if self.state_initialized.swap(true, Ordering::SeqCst) {
            return Err(StateError::invalid_operation(
                "The component state has already been initialized.",
            ));
        }
        self.component.initialize_state();
        self.component.initialize_state_async().await?;
        debug!(component = self.info.short_name(), "state initialized");

        if let Some(link) = self.link.get() {
            link.scope().refresh_container()?;
        }
        Ok(())
    }

    fn link_to_parent(&self, parameters: &ParameterView) -> Result<(), StateError> {
        if self.link.get().is_some() {
            return Ok(());
        }
        if parameters.has_cascade(STATE_ROOT_CASCADE)
            && parameters.cascading::<PageScope>(STATE_ROOT_CASCADE).is_none()
        {
            return Err(StateError::invalid_operation(
                "The state root is not a persistent page.",
            ));
        }
        let Some(parent) = parameters.cascading::<StateLink>(STATE_PARENT_CASCADE) else {
            trace!(component = self.info.short_name(), "no state parent");
            return Ok(());
        };

        let position =
            PositionIdentifier::resolve(self.component.state_id().as_deref(), self.info.component_type())?;
        let entry = StateEntry {
            component: Arc::clone(&self.component),
            info: Arc::clone(&self.info),
        };
        let node = parent.scope().attach_child(parent.node(), position, entry)?;
        let _ = self
            .link
            .set(Arc::new(StateLink::new(Arc::clone(parent.scope()), node)));
        Ok(())
    }

    #[instrument(skip_all, fields(component = self.info.short_name()))]
    async fn setup_state(&self, renderer: &RendererInfo) -> Result<(), StateError> {
        if self.is_state_initialized() {
            return Err(StateError::invalid_operation(
                "The component state has already been initialized.",
            ));
        }
        if renderer.is_interactive && self.try_restore_state().await? {
            return Ok(());
        }
        self.initialize_state().await
    }

    async fn try_restore_state(&self) -> Result<bool, StateError> {
        let Some(link) = self.link.get() else {
            return Ok(false);
        };
        let result = self.restore_from(link).await;
        if link.is_root() {
            match result {
                Ok(true) => link.scope().report_restored(),
                _ => link.scope().report_restore_failed(),
            }
        }
        result
    }

    async fn restore_from(&self, link: &Arc<StateLink>) -> Result<bool, StateError> {
        let Some(properties) = self.capability.try_restore(link, &self.config).await? else {
            return Ok(false);
        };

        let component = (*self.component).as_any();
        for member in self.info.members() {
            if let Some(value) = find_property(&properties, member.wire_name()) {
                member.write(component, value.clone())?;
            }
        }

        self.state_initialized.store(true, Ordering::SeqCst);
        self.state_restored.store(true, Ordering::SeqCst);
        debug!(component = self.info.short_name(), "state restored");
        self.component.on_state_restored();
        Ok(true)
    }
}

#[async_trait]
impl StrategyExtension for PersistentStateExtension {
    fn attached(&self, renderer: &RendererInfo) {
        self.capability.attached(renderer);
    }

    fn parameters_received(&self, parameters: &ParameterView) -> Result<(), LifecycleError> {
        self.link_to_parent(parameters).map_err(Into::into)
    }

    async fn before_initialize(&self, renderer: &RendererInfo) -> Result<(), LifecycleError> {
        self.setup_state(renderer).await.map_err(Into::into)
    }

    fn disposed(&self) {
        let Some(link) = self.link.get() else {
            return;
        };
        if link.is_root() || link.scope().detach(link.node()) == 0 {
            return;
        }
        if let Err(error) = link.scope().refresh_container() {
            warn!(%error, component = self.info.short_name(), "state container refresh failed");
        }
    }

    fn build_render_tree(&self, builder: &mut RenderTreeBuilder, content: &RenderFragment) {
        self.capability
            .build_scoped_subtree(self.link.get(), builder, content);
    }
}
