//! In-memory render host.
//!
//! Drives components to quiescence on the current task: evaluates queued
//! renders, mounts child components found in the output, pushes
//! parameters, and (for interactive renderers) delivers after-render
//! notifications. A child missing from its parent's new output is disposed
//! together with its subtree. The resulting markup can be read back as a
//! string.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, error, instrument};

use crate::domain::{
    escape_html, CascadingValue, ParameterView, RenderFragment, RenderFrame, RenderTreeBuilder,
    RendererInfo,
};
use crate::error::LifecycleError;
use crate::ports::{Component, RenderHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Cascades = BTreeMap<String, CascadingValue>;
type PendingTask = BoxFuture<'static, (ComponentId, Result<(), LifecycleError>)>;

enum OutputNode {
    Markup(String),
    Child(ComponentId),
}

struct ComponentRecord {
    component: Arc<dyn Component>,
    parameters: ParameterView,
    /// Cascades in scope where the component sits
    cascades: Cascades,
    output: Vec<OutputNode>,
    render_count: usize,
}

#[derive(Default)]
struct Registry {
    records: HashMap<ComponentId, ComponentRecord>,
    by_address: HashMap<usize, ComponentId>,
}

struct Shared {
    info: RendererInfo,
    queue: Mutex<VecDeque<(ComponentId, RenderFragment)>>,
    queued: Notify,
    registry: Mutex<Registry>,
    errors: Mutex<Vec<LifecycleError>>,
    next_id: AtomicU64,
    metadata_update: AtomicBool,
    this: Weak<Shared>,
}

pub struct InMemoryRenderer {
    shared: Arc<Shared>,
    root: Mutex<Option<ComponentId>>,
}

impl InMemoryRenderer {
    pub fn new(info: RendererInfo) -> Self {
        let shared = Arc::new_cyclic(|this| Shared {
            info,
            queue: Mutex::new(VecDeque::new()),
            queued: Notify::new(),
            registry: Mutex::new(Registry::default()),
            errors: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            metadata_update: AtomicBool::new(false),
            this: this.clone(),
        });
        Self {
            shared,
            root: Mutex::new(None),
        }
    }

    pub fn renderer_info(&self) -> &RendererInfo {
        &self.shared.info
    }

    pub fn set_rendering_on_metadata_update(&self, enabled: bool) {
        self.shared.metadata_update.store(enabled, Ordering::SeqCst);
    }

    /// Mount `component` as the root and run until nothing is left to do.
    ///
    /// Lifecycle failures are collected (see [`take_errors`](Self::take_errors));
    /// only a failed attach of the root itself is returned.
    #[instrument(skip_all, fields(renderer = %self.shared.info))]
    pub async fn render_root(
        &self,
        component: Arc<dyn Component>,
        parameters: ParameterView,
    ) -> Result<ComponentId, LifecycleError> {
        let mut pending = FuturesUnordered::new();
        let parameters = parameters.inherit_cascades(&Cascades::new());
        let id = self
            .shared
            .mount(component, parameters, &Cascades::new(), &mut pending)?;
        *self.root.lock() = Some(id);
        self.drive(pending).await;
        Ok(id)
    }

    /// Process renders requested since the last pass, e.g. after an event.
    pub async fn run_until_quiescent(&self) {
        self.drive(FuturesUnordered::new()).await;
    }

    pub fn root_id(&self) -> Option<ComponentId> {
        *self.root.lock()
    }

    /// Markup of the whole tree under the root.
    pub fn to_markup(&self) -> String {
        self.root_id()
            .map(|id| self.markup(id))
            .unwrap_or_default()
    }

    pub fn markup(&self, id: ComponentId) -> String {
        let registry = self.shared.registry.lock();
        let mut markup = String::new();
        write_markup(&registry.records, id, &mut markup);
        markup
    }

    pub fn component_id<C: Component + ?Sized>(&self, component: &Arc<C>) -> Option<ComponentId> {
        self.shared
            .registry
            .lock()
            .by_address
            .get(&address_of(component))
            .copied()
    }

    pub fn render_count(&self, id: ComponentId) -> usize {
        self.shared
            .registry
            .lock()
            .records
            .get(&id)
            .map_or(0, |record| record.render_count)
    }

    pub fn component_count(&self) -> usize {
        self.shared.registry.lock().records.len()
    }

    /// Drain the errors collected so far.
    pub fn take_errors(&self) -> Vec<LifecycleError> {
        std::mem::take(&mut *self.shared.errors.lock())
    }

    async fn drive(&self, mut pending: FuturesUnordered<PendingTask>) {
        let mut rendered = Vec::new();
        loop {
            rendered.extend(self.shared.process_queue(&mut pending));

            if pending.is_empty() {
                if self.shared.info.is_interactive && !rendered.is_empty() {
                    let mut seen = HashSet::new();
                    for id in rendered.drain(..) {
                        if seen.insert(id) {
                            if let Some(component) = self.shared.component(id) {
                                pending.push(Box::pin(async move {
                                    (id, component.on_after_render().await)
                                }));
                            }
                        }
                    }
                    continue;
                }
                break;
            }

            tokio::select! {
                Some((id, result)) = pending.next() => {
                    if let Err(error) = result {
                        self.shared.report(id, error);
                    }
                }
                _ = self.shared.queued.notified() => {}
            }
        }
    }
}

impl Shared {
    fn process_queue(&self, pending: &mut FuturesUnordered<PendingTask>) -> Vec<ComponentId> {
        let mut rendered = Vec::new();
        loop {
            let next = self.queue.lock().pop_front();
            let Some((id, fragment)) = next else {
                break;
            };
            let scope = match self.registry.lock().records.get(&id) {
                Some(record) => record.cascades.clone(),
                None => continue,
            };

            let mut builder = RenderTreeBuilder::new();
            fragment.render(&mut builder);
            let mut output = Vec::new();
            self.resolve(builder.into_frames(), &scope, &mut output, pending);

            let removed = match self.registry.lock().records.get_mut(&id) {
                Some(record) => {
                    let previous = std::mem::replace(&mut record.output, output);
                    record.render_count += 1;
                    let kept: HashSet<ComponentId> = child_ids(&record.output).collect();
                    child_ids(&previous)
                        .filter(|child| !kept.contains(child))
                        .collect::<Vec<_>>()
                }
                None => Vec::new(),
            };
            for child in removed {
                self.dispose(child);
            }
            rendered.push(id);
        }
        rendered
    }

    fn resolve(
        &self,
        frames: Vec<RenderFrame>,
        scope: &Cascades,
        output: &mut Vec<OutputNode>,
        pending: &mut FuturesUnordered<PendingTask>,
    ) {
        for frame in frames {
            match frame {
                RenderFrame::Markup(markup) => output.push(OutputNode::Markup(markup)),
                RenderFrame::Text(text) => output.push(OutputNode::Markup(escape_html(&text))),
                RenderFrame::Cascade {
                    name,
                    value,
                    content,
                } => {
                    let mut inner = scope.clone();
                    inner.insert(name, value);
                    self.resolve(content, &inner, output, pending);
                }
                RenderFrame::Component {
                    component,
                    parameters,
                } => match self.mount_or_update(component, parameters, scope, pending) {
                    Ok(id) => output.push(OutputNode::Child(id)),
                    Err(error) => {
                        error!(%error, "failed to mount child component");
                        self.errors.lock().push(error);
                    }
                },
            }
        }
    }

    fn mount_or_update(
        &self,
        component: Arc<dyn Component>,
        parameters: ParameterView,
        scope: &Cascades,
        pending: &mut FuturesUnordered<PendingTask>,
    ) -> Result<ComponentId, LifecycleError> {
        let parameters = parameters.inherit_cascades(scope);
        let existing = {
            let mut registry = self.registry.lock();
            let known = registry.by_address.get(&address_of(&component)).copied();
            match known.and_then(|id| registry.records.get_mut(&id).map(|record| (id, record))) {
                Some((id, record)) => {
                    let changed = !record.parameters.same_as(&parameters);
                    if changed {
                        record.parameters = parameters.clone();
                        record.cascades = scope.clone();
                    }
                    Some((id, changed))
                }
                None => None,
            }
        };

        match existing {
            Some((id, true)) => {
                pending.push(set_parameters_task(id, component, parameters));
                Ok(id)
            }
            Some((id, false)) => Ok(id),
            None => self.mount(component, parameters, scope, pending),
        }
    }

    fn mount(
        &self,
        component: Arc<dyn Component>,
        parameters: ParameterView,
        scope: &Cascades,
        pending: &mut FuturesUnordered<PendingTask>,
    ) -> Result<ComponentId, LifecycleError> {
        let id = ComponentId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = Arc::new(InMemoryRenderHandle {
            id,
            info: self.info.clone(),
            shared: self.this.clone(),
        });
        component.attach(handle)?;
        debug!(%id, component = component.component_name(), "mounted");

        {
            let mut registry = self.registry.lock();
            registry.by_address.insert(address_of(&component), id);
            registry.records.insert(
                id,
                ComponentRecord {
                    component: Arc::clone(&component),
                    parameters: parameters.clone(),
                    cascades: scope.clone(),
                    output: Vec::new(),
                    render_count: 0,
                },
            );
        }
        pending.push(set_parameters_task(id, component, parameters));
        Ok(id)
    }

    fn component(&self, id: ComponentId) -> Option<Arc<dyn Component>> {
        self.registry
            .lock()
            .records
            .get(&id)
            .map(|record| Arc::clone(&record.component))
    }

    /// Unmount `id` and everything it rendered, children first.
    fn dispose(&self, id: ComponentId) {
        let record = {
            let mut registry = self.registry.lock();
            let Some(record) = registry.records.remove(&id) else {
                return;
            };
            registry.by_address.remove(&address_of(&record.component));
            record
        };
        for child in child_ids(&record.output) {
            self.dispose(child);
        }
        debug!(%id, component = record.component.component_name(), "disposed");
        record.component.dispose();
    }

    fn report(&self, id: ComponentId, error: LifecycleError) {
        if error.is_cancellation() {
            return;
        }
        error!(%id, %error, "component lifecycle failed");
        self.errors.lock().push(error);
    }
}

fn set_parameters_task(
    id: ComponentId,
    component: Arc<dyn Component>,
    parameters: ParameterView,
) -> PendingTask {
    Box::pin(async move { (id, component.set_parameters(parameters).await) })
}

fn child_ids(output: &[OutputNode]) -> impl Iterator<Item = ComponentId> + '_ {
    output.iter().filter_map(|node| match node {
        OutputNode::Child(id) => Some(*id),
        OutputNode::Markup(_) => None,
    })
}

fn address_of<C: ?Sized>(component: &Arc<C>) -> usize {
    Arc::as_ptr(component).cast::<()>() as usize
}

fn write_markup(records: &HashMap<ComponentId, ComponentRecord>, id: ComponentId, markup: &mut String) {
    let Some(record) = records.get(&id) else {
        return;
    };
    for node in &record.output {
        match node {
            OutputNode::Markup(text) => markup.push_str(text),
            OutputNode::Child(child) => write_markup(records, *child, markup),
        }
    }
}

struct InMemoryRenderHandle {
    id: ComponentId,
    info: RendererInfo,
    shared: Weak<Shared>,
}

impl RenderHandle for InMemoryRenderHandle {
    fn render(&self, fragment: RenderFragment) -> Result<(), LifecycleError> {
        let shared = self
            .shared
            .upgrade()
            .ok_or_else(|| LifecycleError::Render("the renderer has been dropped".into()))?;
        shared.queue.lock().push_back((self.id, fragment));
        shared.queued.notify_one();
        Ok(())
    }

    fn renderer_info(&self) -> RendererInfo {
        self.info.clone()
    }

    fn is_rendering_on_metadata_update(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.metadata_update.load(Ordering::SeqCst))
    }

    fn dispatch_exception(&self, error: LifecycleError) {
        match self.shared.upgrade() {
            Some(shared) => shared.report(self.id, error),
            None => error!(id = %self.id, %error, "error dispatched after renderer was dropped"),
        }
    }
}
