//! Domain layer: prerequisites, parameters and the render tree model.

pub mod callback;
pub mod lifecycle;
pub mod parameters;
pub mod prerequisite;
pub mod prerequisite_collection;
pub mod render_tree;
pub mod renderer_info;

pub use callback::PrerequisiteCallback;
pub use lifecycle::LifecyclePhase;
pub use parameters::{CascadingValue, ParameterView, CHILD_CONTENT};
pub use prerequisite::{
    CompletionDetection, Condition, Prerequisite, PrerequisiteBuilder,
    DEFAULT_PREREQUISITE_TIMEOUT, MIN_POLL_PERIOD,
};
pub use prerequisite_collection::PrerequisiteCollection;
pub use render_tree::{escape_html, RenderFragment, RenderFrame, RenderTreeBuilder};
pub use renderer_info::RendererInfo;
