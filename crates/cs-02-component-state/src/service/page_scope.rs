//! Per-page persistence scope.
//!
//! One scope exists per page instance. It owns the page's state graph, the
//! parsed page state once the page restored it, the restoration signal
//! descendants wait on, and the state container that re-emits the blob.
//!
//! Descendants reach the scope through cascading values:
//!
//! | Cascade | Value |
//! |---------|-------|
//! | `StateRoot` | `Arc<PageScope>` |
//! | `StateParent` | `Arc<StateLink>` of the nearest persistent ancestor |

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use cs_01_render_strategies::{CascadingValue, ComponentRenderStrategy, LifecycleError, TimeoutError};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::debug;

use crate::domain::{ComponentStateInfo, NodeId, PageState, PositionIdentifier, RestoreStatus, StateGraph};
use crate::error::StateError;
use crate::ports::PersistentComponent;

/// Cascade name carrying the page's `Arc<PageScope>`.
pub const STATE_ROOT_CASCADE: &str = "StateRoot";
/// Cascade name carrying the nearest persistent ancestor's `Arc<StateLink>`.
pub const STATE_PARENT_CASCADE: &str = "StateParent";

/// A registered persistent component and its state description.
#[derive(Clone)]
pub struct StateEntry {
    pub component: Arc<dyn PersistentComponent>,
    pub info: Arc<ComponentStateInfo>,
}

/// Persistence state shared by a page and its persistent descendants.
pub struct PageScope {
    graph: Mutex<StateGraph<StateEntry>>,
    page_state: OnceLock<PageState>,
    restore: watch::Sender<RestoreStatus>,
    container: Mutex<Option<Arc<ComponentRenderStrategy>>>,
}

impl PageScope {
    /// Scope whose graph holds only the page entry, restoration pending.
    pub fn new(root: StateEntry) -> Arc<Self> {
        let key = entry_key(&root);
        let (restore, _) = watch::channel(RestoreStatus::Pending);
        Arc::new(Self {
            graph: Mutex::new(StateGraph::new(key, root)),
            page_state: OnceLock::new(),
            restore,
            container: Mutex::new(None),
        })
    }

    /// Link `entry` below `parent` at `position`.
    ///
    /// Attaching the same component again returns its existing node.
    pub fn attach_child(
        &self,
        parent: NodeId,
        position: PositionIdentifier,
        entry: StateEntry,
    ) -> Result<NodeId, StateError> {
        let key = entry_key(&entry);
        let node = self.graph.lock().attach(parent, key, position.clone(), entry)?;
        debug!(%position, ?node, ?parent, "state child linked");
        Ok(node)
    }

    /// Remove `node` and its subtree once its component left the render
    /// tree. Returns how many nodes went away.
    pub fn detach(&self, node: NodeId) -> usize {
        let removed = self.graph.lock().remove(node);
        if removed > 0 {
            debug!(?node, removed, "state subtree detached");
        }
        removed
    }

    /// Position path of `node` below the page root.
    pub fn path(&self, node: NodeId) -> Vec<PositionIdentifier> {
        self.graph.lock().path(node)
    }

    /// Run `f` with the graph locked. `f` must not call back into the scope.
    pub fn with_graph<R>(&self, f: impl FnOnce(&StateGraph<StateEntry>) -> R) -> R {
        f(&self.graph.lock())
    }

    /// The page state restored by the root, if any.
    pub fn page_state(&self) -> Option<&PageState> {
        self.page_state.get()
    }

    pub(crate) fn set_page_state(&self, state: PageState) -> Result<(), StateError> {
        self.page_state
            .set(state)
            .map_err(|_| StateError::invalid_operation("The page state has already been restored."))
    }

    /// Current restoration outcome as reported by the root.
    pub fn restore_status(&self) -> RestoreStatus {
        *self.restore.borrow()
    }

    pub(crate) fn report_restored(&self) {
        self.restore.send_replace(RestoreStatus::Restored);
    }

    pub(crate) fn report_restore_failed(&self) {
        self.restore.send_replace(RestoreStatus::Failed);
    }

    /// Wait until the root reports restoration as done or failed.
    pub async fn wait_for_restore(&self, limit: Duration) -> Result<RestoreStatus, StateError> {
        let mut receiver = self.restore.subscribe();
        let result = match timeout(limit, receiver.wait_for(|status| *status != RestoreStatus::Pending)).await {
            Ok(Ok(status)) => Ok(*status),
            Ok(Err(_)) => Ok(RestoreStatus::Failed),
            Err(_) => Err(TimeoutError::new("page state restoration", limit).into()),
        };
        result
    }

    pub(crate) fn set_container(&self, container: Arc<ComponentRenderStrategy>) {
        *self.container.lock() = Some(container);
    }

    /// The mounted state container strategy, if the page persists.
    pub fn container(&self) -> Option<Arc<ComponentRenderStrategy>> {
        self.container.lock().clone()
    }

    /// Re-render the state container so the emitted blob reflects new state.
    /// No-op while the container is not mounted.
    pub fn refresh_container(&self) -> Result<(), LifecycleError> {
        match self.container() {
            Some(container) if container.is_attached() => container.state_has_changed(),
            _ => Ok(()),
        }
    }

    /// The scope as a `StateRoot` cascading value.
    pub fn as_cascade(self: &Arc<Self>) -> CascadingValue {
        Arc::clone(self) as CascadingValue
    }
}

/// A persistent component's place in its page: the scope and its node.
#[derive(Clone)]
pub struct StateLink {
    scope: Arc<PageScope>,
    node: NodeId,
}

impl StateLink {
    /// Link to `node` in `scope`.
    pub fn new(scope: Arc<PageScope>, node: NodeId) -> Self {
        Self { scope, node }
    }

    pub fn scope(&self) -> &Arc<PageScope> {
        &self.scope
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// True for the page itself.
    pub fn is_root(&self) -> bool {
        self.node.is_root()
    }

    /// Position path from the page root to this node.
    pub fn path(&self) -> Vec<PositionIdentifier> {
        self.scope.path(self.node)
    }
}

pub(crate) fn entry_key(entry: &StateEntry) -> usize {
    Arc::as_ptr(&entry.component).cast::<()>() as usize
}
