use crate::domain::{RenderFragment, RendererInfo};
use crate::error::LifecycleError;

/// Handle a renderer gives a component on attach.
///
/// `render` queues the fragment; hosts evaluate it later, never
/// re-entrantly from inside the call.
pub trait RenderHandle: Send + Sync {
    fn render(&self, fragment: RenderFragment) -> Result<(), LifecycleError>;

    fn renderer_info(&self) -> RendererInfo;

    /// True while the host re-renders everything after a code metadata
    /// update; components render even if they would otherwise decline.
    fn is_rendering_on_metadata_update(&self) -> bool {
        false
    }

    /// Report an error raised outside the normal lifecycle call chain.
    fn dispatch_exception(&self, error: LifecycleError);
}
