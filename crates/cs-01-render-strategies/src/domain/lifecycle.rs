use std::fmt;

/// Where a strategy-rendered component is in its lifecycle.
///
/// ```text
/// Unattached → Attached → Initializing → ParametersSet → Rendered ⇄ Rendered → AfterRendered
///                                                                     any ──→ Disposed
/// ```
///
/// `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecyclePhase {
    #[default]
    Unattached,
    Attached,
    Initializing,
    ParametersSet,
    Rendered,
    AfterRendered,
    Disposed,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unattached => "unattached",
            Self::Attached => "attached",
            Self::Initializing => "initializing",
            Self::ParametersSet => "parameters-set",
            Self::Rendered => "rendered",
            Self::AfterRendered => "after-rendered",
            Self::Disposed => "disposed",
        };
        f.write_str(name)
    }
}
