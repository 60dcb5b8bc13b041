//! Minimal render tree model.
//!
//! A component renders by appending frames to a [`RenderTreeBuilder`].
//! Frames are markup, escaped text, child components and cascade scopes.
//! Hosts turn the frames into output and mount the child components.

use std::fmt;
use std::sync::Arc;

use super::parameters::{CascadingValue, ParameterView};
use crate::ports::Component;

/// A deferred piece of render output.
#[derive(Clone)]
pub struct RenderFragment(Arc<dyn Fn(&mut RenderTreeBuilder) + Send + Sync>);

impl RenderFragment {
    pub fn new(render: impl Fn(&mut RenderTreeBuilder) + Send + Sync + 'static) -> Self {
        Self(Arc::new(render))
    }

    pub fn empty() -> Self {
        Self::new(|_| {})
    }

    pub fn render(&self, builder: &mut RenderTreeBuilder) {
        (self.0)(builder)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for RenderFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderFragment")
    }
}

pub enum RenderFrame {
    /// Raw markup, emitted as-is
    Markup(String),
    /// Text content, escaped on output
    Text(String),
    Component {
        component: Arc<dyn Component>,
        parameters: ParameterView,
    },
    /// A named value visible to every component rendered inside `content`
    Cascade {
        name: String,
        value: CascadingValue,
        content: Vec<RenderFrame>,
    },
}

impl fmt::Debug for RenderFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markup(markup) => f.debug_tuple("Markup").field(markup).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Component { component, parameters } => f
                .debug_struct("Component")
                .field("component", &component.component_name())
                .field("parameters", parameters)
                .finish(),
            Self::Cascade { name, content, .. } => f
                .debug_struct("Cascade")
                .field("name", name)
                .field("content", content)
                .finish(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderTreeBuilder {
    frames: Vec<RenderFrame>,
}

impl RenderTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_markup(&mut self, markup: impl Into<String>) {
        self.frames.push(RenderFrame::Markup(markup.into()));
    }

    pub fn add_text(&mut self, text: impl Into<String>) {
        self.frames.push(RenderFrame::Text(text.into()));
    }

    pub fn add_component(&mut self, component: Arc<dyn Component>, parameters: ParameterView) {
        self.frames.push(RenderFrame::Component {
            component,
            parameters,
        });
    }

    /// Open a cascade scope; frames added by `content` see `value` under `name`.
    pub fn add_cascading_value(
        &mut self,
        name: impl Into<String>,
        value: CascadingValue,
        content: impl FnOnce(&mut RenderTreeBuilder),
    ) {
        let mut inner = RenderTreeBuilder::new();
        content(&mut inner);
        self.frames.push(RenderFrame::Cascade {
            name: name.into(),
            value,
            content: inner.frames,
        });
    }

    pub fn frames(&self) -> &[RenderFrame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RenderFrame> {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Escape text for inclusion in markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
