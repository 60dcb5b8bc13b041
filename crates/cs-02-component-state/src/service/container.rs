use std::sync::{Arc, Weak};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cs_01_render_strategies::{
    LifecycleError, ParameterView, RenderFragment, RenderTreeBuilder, StrategyRenderedComponent,
    CHILD_CONTENT,
};
use parking_lot::Mutex;
use tracing::{error, trace};

use super::composer::StateComposer;
use super::page_scope::PageScope;

/// Emits the page's state blob ahead of the page content.
///
/// Mounted by a page on the prerender pass only. Every persistent component
/// that initializes its state asks the container to re-render, so the last
/// render carries the state of the whole tree.
pub struct PageStateContainer {
    scope: Weak<PageScope>,
    composer: StateComposer,
    element_id: String,
    child_content: Mutex<Option<RenderFragment>>,
}

impl PageStateContainer {
    pub fn new(scope: &Arc<PageScope>, composer: StateComposer, element_id: impl Into<String>) -> Self {
        Self {
            scope: Arc::downgrade(scope),
            composer,
            element_id: element_id.into(),
            child_content: Mutex::new(None),
        }
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }
}

impl StrategyRenderedComponent for PageStateContainer {
    fn set_parameter_properties(&self, parameters: &ParameterView) -> Result<(), LifecycleError> {
        *self.child_content.lock() = parameters.fragment(CHILD_CONTENT);
        Ok(())
    }

    fn build_render_tree(&self, builder: &mut RenderTreeBuilder) {
        if let Some(scope) = self.scope.upgrade() {
            match self.composer.serialize_state(&scope) {
                Ok(Some(json)) => builder.add_markup(state_element(&self.element_id, &json)),
                Ok(None) => trace!("page has no state to persist"),
                Err(err) => {
                    error!(error = %err, "failed to serialize page state");
                    if let Some(container) = scope.container() {
                        container.dispatch_exception(err.into());
                    }
                }
            }
        }

        let content = self.child_content.lock().clone();
        if let Some(content) = content {
            content.render(builder);
        }
    }
}

/// `<script id="{id}" type="text/template">{base64}</script>`
pub fn state_element(element_id: &str, json: &[u8]) -> String {
    format!(
        r#"<script id="{element_id}" type="text/template">{}</script>"#,
        STANDARD.encode(json)
    )
}
