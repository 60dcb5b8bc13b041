//! # Render Strategies (cs-01)
//!
//! Sequences a component's lifecycle on behalf of the rendering host.
//!
//! ## Responsibilities
//!
//! - Gate initialization on [`Prerequisite`]s (manual or polled)
//! - Run the one-time initialization path, then the parameters-set path
//! - Coalesce render requests and honour `should_render`
//! - Let extensions hook attach, parameters, initialization and rendering
//!   (see [`StrategyExtension`]); state persistence is built this way
//!
//! ## Hexagonal Architecture
//!
//! - **Domain** (`domain/`): prerequisites, parameters, render tree model
//! - **Ports** (`ports/`): [`Component`], [`StrategyRenderedComponent`], [`RenderHandle`]
//! - **Service** (`service/`): [`ComponentRenderStrategy`]
//! - **Adapters** (`adapters/`): [`InMemoryRenderer`]
//!
//! ## Example
//!
//! ```rust,ignore
//! let strategy = ComponentRenderStrategy::new(Arc::new(MyComponent::default()));
//! let renderer = InMemoryRenderer::new(RendererInfo::STATIC);
//! renderer.render_root(strategy, ParameterView::new()).await?;
//! println!("{}", renderer.to_markup());
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{ComponentId, InMemoryRenderer};
pub use domain::{
    escape_html, CascadingValue, CompletionDetection, LifecyclePhase, ParameterView,
    Prerequisite, PrerequisiteBuilder, PrerequisiteCallback, PrerequisiteCollection,
    RenderFragment, RenderFrame, RenderTreeBuilder, RendererInfo, CHILD_CONTENT,
    DEFAULT_PREREQUISITE_TIMEOUT, MIN_POLL_PERIOD,
};
pub use error::{ignore_cancellation, LifecycleError, TaskOutcome, TimeoutError};
pub use ports::{Component, RenderHandle, StrategyRenderedComponent};
pub use service::{ComponentRenderStrategy, DefaultExtension, RenderWrapper, StrategyExtension};
