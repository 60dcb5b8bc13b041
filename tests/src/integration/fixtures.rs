//! Shared fixtures: a counter page, counters, panels and render helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cs_01_render_strategies::{
    Component, InMemoryRenderer, LifecycleError, ParameterView, RenderTreeBuilder, RendererInfo,
    StrategyRenderedComponent,
};
use cs_02_component_state::{
    ComponentStateRegistry, DocumentBridge, InMemoryDocument, PersistenceConfig,
    PersistenceServices, PersistentComponent, PersistentRenderStrategy, RenderStrategyFactory,
    StateMembers, DEFAULT_STATE_ELEMENT_ID,
};
use parking_lot::Mutex;

// =============================================================================
// COMPONENTS
// =============================================================================

/// Persists `value`; initializes it to `initial`.
pub struct Counter {
    value: Mutex<i64>,
    initial: i64,
    id: Option<String>,
    init_calls: AtomicUsize,
    restored_calls: AtomicUsize,
}

impl Counter {
    pub fn new(initial: i64) -> Arc<Self> {
        Self::build(None, initial)
    }

    pub fn with_id(id: &str, initial: i64) -> Arc<Self> {
        Self::build(Some(id.to_string()), initial)
    }

    fn build(id: Option<String>, initial: i64) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(0),
            initial,
            id,
            init_calls: AtomicUsize::new(0),
            restored_calls: AtomicUsize::new(0),
        })
    }

    pub fn value(&self) -> i64 {
        *self.value.lock()
    }

    pub fn increment(&self) {
        *self.value.lock() += 1;
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn restored_calls(&self) -> usize {
        self.restored_calls.load(Ordering::SeqCst)
    }
}

impl StrategyRenderedComponent for Counter {
    fn build_render_tree(&self, builder: &mut RenderTreeBuilder) {
        builder.add_markup(r#"<span class="counter">"#);
        builder.add_text(self.value().to_string());
        builder.add_markup("</span>");
    }
}

#[async_trait]
impl PersistentComponent for Counter {
    fn describe_state(members: &mut StateMembers<Self>) {
        members.member("value", |c: &Counter| *c.value.lock(), |c, v| *c.value.lock() = v);
    }

    fn state_id(&self) -> Option<String> {
        self.id.clone()
    }

    async fn initialize_state_async(&self) -> Result<(), LifecycleError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        *self.value.lock() = self.initial;
        Ok(())
    }

    fn on_state_restored(&self) {
        self.restored_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Persistent grouping with no members of its own.
pub struct Panel {
    id: String,
    children: Vec<Arc<dyn Component>>,
}

impl Panel {
    pub fn new(id: &str, children: Vec<Arc<dyn Component>>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            children,
        })
    }
}

impl StrategyRenderedComponent for Panel {
    fn build_render_tree(&self, builder: &mut RenderTreeBuilder) {
        builder.add_markup(format!(r#"<section class="{}">"#, self.id));
        for child in &self.children {
            builder.add_component(Arc::clone(child), ParameterView::new());
        }
        builder.add_markup("</section>");
    }
}

impl PersistentComponent for Panel {
    fn state_id(&self) -> Option<String> {
        Some(self.id.clone())
    }
}

/// Routed page persisting `count`.
pub struct CounterPage {
    count: Mutex<i64>,
    initial: i64,
    children: Mutex<Vec<Arc<dyn Component>>>,
    init_calls: AtomicUsize,
    restored_calls: AtomicUsize,
}

impl CounterPage {
    pub fn new(initial: i64, children: Vec<Arc<dyn Component>>) -> Arc<Self> {
        Arc::new(Self {
            count: Mutex::new(0),
            initial,
            children: Mutex::new(children),
            init_calls: AtomicUsize::new(0),
            restored_calls: AtomicUsize::new(0),
        })
    }

    /// Children rendered from the next render on.
    pub fn set_children(&self, children: Vec<Arc<dyn Component>>) {
        *self.children.lock() = children;
    }

    pub fn count(&self) -> i64 {
        *self.count.lock()
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn restored_calls(&self) -> usize {
        self.restored_calls.load(Ordering::SeqCst)
    }
}

impl StrategyRenderedComponent for CounterPage {
    fn build_render_tree(&self, builder: &mut RenderTreeBuilder) {
        builder.add_markup("<h1>");
        builder.add_text(format!("Count: {}", self.count()));
        builder.add_markup("</h1>");
        let children = self.children.lock().clone();
        for child in children {
            builder.add_component(child, ParameterView::new());
        }
    }
}

impl PersistentComponent for CounterPage {
    fn describe_state(members: &mut StateMembers<Self>) {
        members.member("count", |c: &CounterPage| *c.count.lock(), |c, v| *c.count.lock() = v);
    }

    fn initialize_state(&self) {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        *self.count.lock() = self.initial;
    }

    fn on_state_restored(&self) {
        self.restored_calls.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// SERVICES
// =============================================================================

pub fn registry() -> ComponentStateRegistry {
    ComponentStateRegistry::builder()
        .register_page::<CounterPage>()
        .register::<Counter>()
        .register::<Panel>()
        .build()
}

pub fn factory(document: InMemoryDocument) -> RenderStrategyFactory {
    factory_with(document, PersistenceConfig::default())
}

pub fn factory_with(document: InMemoryDocument, config: PersistenceConfig) -> RenderStrategyFactory {
    let document: Arc<dyn DocumentBridge> = Arc::new(document);
    let services = PersistenceServices::new(registry(), document).with_config(config);
    RenderStrategyFactory::new(Arc::new(services)).unwrap()
}

/// Strategy for a registered persistent component.
pub fn persistent<C: PersistentComponent>(
    factory: &RenderStrategyFactory,
    component: &Arc<C>,
) -> PersistentRenderStrategy {
    factory.create(Arc::clone(component)).unwrap()
}

// =============================================================================
// RENDERING
// =============================================================================

pub async fn render(info: RendererInfo, root: &PersistentRenderStrategy) -> InMemoryRenderer {
    let renderer = InMemoryRenderer::new(info);
    renderer
        .render_root(root.as_component(), ParameterView::new())
        .await
        .unwrap();
    renderer
}

/// Decoded JSON of the state element in `markup`, if any.
pub async fn decode_state(markup: &str, element_id: &str) -> Option<String> {
    let document = InMemoryDocument::from_markup(markup);
    let encoded = document.element_text(element_id).await.unwrap()?;
    let bytes = STANDARD.decode(encoded).unwrap();
    Some(String::from_utf8(bytes).unwrap())
}

pub async fn decode_default_state(markup: &str) -> Option<String> {
    decode_state(markup, DEFAULT_STATE_ELEMENT_ID).await
}

/// Prerender a page with `count` and one `Counter` holding `value`;
/// returns the page markup.
pub async fn prerender_counter_page(count: i64, value: i64) -> String {
    let factory = factory(InMemoryDocument::new());
    let counter = persistent(&factory, &Counter::new(value));
    let page = persistent(&factory, &CounterPage::new(count, vec![counter.as_component()]));

    let renderer = render(RendererInfo::STATIC, &page).await;
    assert!(renderer.take_errors().is_empty());
    renderer.to_markup()
}
