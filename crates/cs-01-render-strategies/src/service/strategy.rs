//! The base lifecycle engine.
//!
//! ## Lifecycle
//!
//! ```text
//! attach ──→ set_parameters (first) ──→ extension.before_initialize
//!                                        before-init prerequisites
//!                                        initialize / initialize_async
//!                                        after-init prerequisites
//!                                        on_initialized / on_initialized_async
//!                                        on_parameters_set / _async ──→ render
//!            set_parameters (later) ───→ on_parameters_set / _async ──→ render
//! ```
//!
//! Render requests coalesce: while one is queued, further requests are
//! dropped. After-render notifications never trigger rendering.
//!
//! Cancellation of an awaited hook is swallowed; any other failure
//! propagates to the caller.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::task::Poll;

use parking_lot::Mutex;
use tracing::{debug, error, instrument, trace};

use super::extension::{DefaultExtension, StrategyExtension};
use crate::domain::{LifecyclePhase, ParameterView, RenderFragment, RenderTreeBuilder, RendererInfo};
use crate::error::{ignore_cancellation, LifecycleError, TaskOutcome};
use crate::ports::{Component, RenderHandle, StrategyRenderedComponent};

/// Replaces the default render fragment; receives the default so it can wrap it.
pub type RenderWrapper = Arc<dyn Fn(&mut RenderTreeBuilder, &RenderFragment) + Send + Sync>;

/// Drives one component through its lifecycle on behalf of the renderer.
///
/// Variant behaviour (persistence, restoration) plugs in through a
/// `StrategyExtension`; the engine itself stays the same for every component.
pub struct ComponentRenderStrategy {
    component: Arc<dyn StrategyRenderedComponent>,
    extension: Arc<dyn StrategyExtension>,
    name: &'static str,
    state: Mutex<EngineState>,
    this: Weak<ComponentRenderStrategy>,
}

#[derive(Default)]
struct EngineState {
    phase: LifecyclePhase,
    handle: Option<Arc<dyn RenderHandle>>,
    initialized: bool,
    has_never_rendered: bool,
    has_pending_queued_render: bool,
    has_called_on_after_render: bool,
    initialize_completed: bool,
    on_initialized_completed: bool,
    disposed: bool,
    render_wrapper: Option<RenderWrapper>,
}

impl EngineState {
    /// Move to `phase` unless disposed.
    fn enter(&mut self, phase: LifecyclePhase) {
        if !self.disposed {
            self.phase = phase;
        }
    }
}

impl ComponentRenderStrategy {
    /// Plain strategy with no extension.
    pub fn new(component: Arc<dyn StrategyRenderedComponent>) -> Arc<Self> {
        Self::with_extension(component, Arc::new(DefaultExtension))
    }

    /// Strategy whose lifecycle is extended by `extension`.
    pub fn with_extension(
        component: Arc<dyn StrategyRenderedComponent>,
        extension: Arc<dyn StrategyExtension>,
    ) -> Arc<Self> {
        let name = component.type_name();
        Arc::new_cyclic(|this| Self {
            component,
            extension,
            name,
            state: Mutex::new(EngineState {
                has_never_rendered: true,
                ..EngineState::default()
            }),
            this: this.clone(),
        })
    }

    // =========================================================================
    // Lifecycle entry points
    // =========================================================================

    /// Bind to a renderer. Allowed exactly once.
    pub fn attach(&self, handle: Arc<dyn RenderHandle>) -> Result<(), LifecycleError> {
        let renderer = {
            let mut state = self.state.lock();
            if state.handle.is_some() {
                return Err(LifecycleError::invalid_operation(
                    "The render handle is already set. Cannot attach a render strategy more than once.",
                ));
            }
            let renderer = handle.renderer_info();
            state.handle = Some(handle);
            state.phase = LifecyclePhase::Attached;
            renderer
        };
        debug!(component = self.name, renderer = %renderer, "attached");
        self.extension.attached(&renderer);
        Ok(())
    }

    /// Apply incoming parameters, then render.
    ///
    /// The first call runs the one-time initialization sequence; later calls
    /// go straight to the parameters-set hooks.
    #[instrument(skip_all, fields(component = self.name))]
    pub async fn set_parameters(&self, parameters: ParameterView) -> Result<(), LifecycleError> {
        if self.is_disposed() {
            trace!(component = self.name, "parameters ignored after dispose");
            return Ok(());
        }
        self.component.set_parameter_properties(&parameters)?;
        self.extension.parameters_received(&parameters)?;

        let first_time = {
            let mut state = self.state.lock();
            if state.initialized {
                false
            } else {
                state.initialized = true;
                state.enter(LifecyclePhase::Initializing);
                true
            }
        };

        if first_time {
            self.init_and_set_parameters().await
        } else {
            self.call_on_parameters_set().await
        }
    }

    /// Request a render. Coalesces with any render already queued.
    pub fn state_has_changed(&self) -> Result<(), LifecycleError> {
        let (handle, has_never_rendered) = {
            let state = self.state.lock();
            if state.has_pending_queued_render || state.disposed {
                return Ok(());
            }
            let handle = state.handle.clone().ok_or_else(|| {
                LifecycleError::invalid_operation(
                    "The render handle is not yet assigned. Attach the render strategy before rendering.",
                )
            })?;
            (handle, state.has_never_rendered)
        };

        let should_render = has_never_rendered
            || self.component.should_render()
            || handle.is_rendering_on_metadata_update();
        if !should_render {
            trace!(component = self.name, "render declined");
            return Ok(());
        }

        {
            let mut state = self.state.lock();
            if state.has_pending_queued_render {
                return Ok(());
            }
            state.has_pending_queued_render = true;
        }

        if let Err(error) = handle.render(self.render_fragment()) {
            self.state.lock().has_pending_queued_render = false;
            return Err(error);
        }
        Ok(())
    }

    /// Called by the host after each render. Never requests a render.
    pub async fn on_after_render(&self) -> Result<(), LifecycleError> {
        let first_render = {
            let mut state = self.state.lock();
            let first_render = !state.has_called_on_after_render;
            state.has_called_on_after_render = true;
            state.enter(LifecyclePhase::AfterRendered);
            first_render
        };
        self.component.on_after_render(first_render);
        self.component.on_after_render_async(first_render).await
    }

    /// Run an event callback. Renders once the synchronous part returns and
    /// again when the rest completes.
    pub async fn handle_event<F>(&self, callback: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = Result<(), LifecycleError>> + Send,
    {
        let mut task = Box::pin(callback);
        let first_poll = futures::poll!(&mut task);
        self.state_has_changed()?;
        match first_poll {
            Poll::Ready(result) => ignore_cancellation(result).map(|_| ()),
            Poll::Pending => self.call_state_has_changed_on_async_completion(task).await,
        }
    }

    /// Await `task`, then render unless it was canceled.
    pub async fn call_state_has_changed_on_async_completion<F>(&self, task: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = Result<(), LifecycleError>> + Send,
    {
        match ignore_cancellation(task.await)? {
            TaskOutcome::Completed => self.state_has_changed(),
            TaskOutcome::Canceled => Ok(()),
        }
    }

    /// Wrap the component's own render fragment from now on.
    pub fn set_custom_render_fragment(&self, wrapper: RenderWrapper) {
        self.state.lock().render_wrapper = Some(wrapper);
    }

    /// Tear the strategy down once its component left the render tree.
    ///
    /// Runs the extension's and the component's dispose hooks exactly once.
    /// Parameters and render requests arriving afterwards are ignored.
    pub fn dispose(&self) {
        {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.phase = LifecyclePhase::Disposed;
            state.has_pending_queued_render = false;
        }
        debug!(component = self.name, "disposed");
        self.extension.disposed();
        self.component.dispose();
    }

    /// Forward an error to the hosting renderer.
    pub fn dispatch_exception(&self, error: LifecycleError) {
        let handle = self.state.lock().handle.clone();
        match handle {
            Some(handle) => handle.dispatch_exception(error),
            None => error!(component = self.name, %error, "unhandled error before attach"),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Most recent lifecycle phase entered.
    pub fn phase(&self) -> LifecyclePhase {
        self.state.lock().phase
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    /// The component's own initialization completed.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialize_completed
    }

    /// Initialization and the on-initialized hooks completed.
    pub fn is_ready(&self) -> bool {
        self.state.lock().on_initialized_completed
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// At least one render was evaluated.
    pub fn has_rendered(&self) -> bool {
        !self.state.lock().has_never_rendered
    }

    /// Renderer the strategy is attached to; fails before `attach`.
    pub fn renderer_info(&self) -> Result<RendererInfo, LifecycleError> {
        self.state
            .lock()
            .handle
            .as_ref()
            .map(|handle| handle.renderer_info())
            .ok_or_else(|| LifecycleError::invalid_operation("The render strategy is not attached."))
    }

    /// The driven component.
    pub fn component(&self) -> &Arc<dyn StrategyRenderedComponent> {
        &self.component
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn init_and_set_parameters(&self) -> Result<(), LifecycleError> {
        let renderer = self.renderer_info()?;
        self.extension.before_initialize(&renderer).await?;

        if let Some(prerequisites) = self.component.prerequisites() {
            prerequisites.ensure_before_initialization().await?;
        }

        self.component.initialize();
        ignore_cancellation(self.component.initialize_async().await)?;
        self.state.lock().initialize_completed = true;
        debug!(component = self.name, "initialized");

        let mut on_initialized = Box::pin(self.run_on_initialized());
        let result = match futures::poll!(&mut on_initialized) {
            Poll::Ready(result) => result,
            Poll::Pending => {
                if !self.component.should_wait_for_complete_initialization() {
                    self.state_has_changed()?;
                }
                on_initialized.await
            }
        };
        ignore_cancellation(result)?;

        self.call_on_parameters_set().await
    }

    async fn run_on_initialized(&self) -> Result<(), LifecycleError> {
        if let Some(prerequisites) = self.component.prerequisites() {
            prerequisites.ensure_after_initialization().await?;
        }
        self.component.on_initialized();
        self.component.on_initialized_async().await?;
        self.state.lock().on_initialized_completed = true;
        Ok(())
    }

    async fn call_on_parameters_set(&self) -> Result<(), LifecycleError> {
        self.component.on_parameters_set();
        let mut task = self.component.on_parameters_set_async();
        let first_poll = futures::poll!(&mut task);
        self.state.lock().enter(LifecyclePhase::ParametersSet);

        // Render whether or not the async work finished.
        self.state_has_changed()?;

        match first_poll {
            Poll::Ready(result) => ignore_cancellation(result).map(|_| ()),
            Poll::Pending => self.call_state_has_changed_on_async_completion(task).await,
        }
    }

    fn render_fragment(&self) -> RenderFragment {
        let this = self.this.clone();
        RenderFragment::new(move |builder| {
            if let Some(strategy) = this.upgrade() {
                strategy.render_into(builder);
            }
        })
    }

    fn render_into(&self, builder: &mut RenderTreeBuilder) {
        let wrapper = {
            let mut state = self.state.lock();
            state.has_pending_queued_render = false;
            state.has_never_rendered = false;
            state.enter(LifecyclePhase::Rendered);
            state.render_wrapper.clone()
        };

        let component = Arc::clone(&self.component);
        let content = RenderFragment::new(move |b| component.build_render_tree(b));
        match wrapper {
            Some(wrapper) => {
                let extension = Arc::clone(&self.extension);
                let default = RenderFragment::new(move |b| extension.build_render_tree(b, &content));
                wrapper(builder, &default);
            }
            None => self.extension.build_render_tree(builder, &content),
        }
        trace!(component = self.name, "rendered");
    }
}

#[async_trait::async_trait]
impl Component for ComponentRenderStrategy {
    fn attach(&self, handle: Arc<dyn RenderHandle>) -> Result<(), LifecycleError> {
        ComponentRenderStrategy::attach(self, handle)
    }

    async fn set_parameters(&self, parameters: ParameterView) -> Result<(), LifecycleError> {
        ComponentRenderStrategy::set_parameters(self, parameters).await
    }

    async fn on_after_render(&self) -> Result<(), LifecycleError> {
        ComponentRenderStrategy::on_after_render(self).await
    }

    fn dispose(&self) {
        ComponentRenderStrategy::dispose(self)
    }

    fn component_name(&self) -> &str {
        self.name
    }
}
