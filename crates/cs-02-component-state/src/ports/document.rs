use async_trait::async_trait;

use crate::error::StateError;

/// Read access to the page the interactive pass runs in.
#[async_trait]
pub trait DocumentBridge: Send + Sync {
    /// Inner text of the element with `element_id`; `Ok(None)` if absent.
    async fn element_text(&self, element_id: &str) -> Result<Option<String>, StateError>;
}
