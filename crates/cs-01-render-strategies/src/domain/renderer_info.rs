//! Renderer description handed to a component when it is attached.

use std::borrow::Cow;
use std::fmt;

/// Name and interactivity of the renderer hosting a component.
///
/// A non-interactive renderer produces static output (the prerender pass);
/// an interactive renderer keeps components alive and dispatches events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RendererInfo {
    pub name: Cow<'static, str>,
    pub is_interactive: bool,
}

impl RendererInfo {
    pub const STATIC: RendererInfo = RendererInfo {
        name: Cow::Borrowed("Static"),
        is_interactive: false,
    };

    pub const SERVER: RendererInfo = RendererInfo {
        name: Cow::Borrowed("Server"),
        is_interactive: true,
    };

    pub const WEB_ASSEMBLY: RendererInfo = RendererInfo {
        name: Cow::Borrowed("WebAssembly"),
        is_interactive: true,
    };

    pub fn new(name: impl Into<Cow<'static, str>>, is_interactive: bool) -> Self {
        Self {
            name: name.into(),
            is_interactive,
        }
    }
}

impl fmt::Display for RendererInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.is_interactive {
            "interactive"
        } else {
            "static"
        };
        write!(f, "{} ({})", self.name, mode)
    }
}
