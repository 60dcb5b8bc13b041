//! Service layer: page scopes, the composer, persistent strategies and
//! their construction.

pub mod composer;
pub mod container;
pub mod factory;
pub mod page_scope;
pub mod persistent_strategy;

pub use composer::StateComposer;
pub use container::{state_element, PageStateContainer};
pub use factory::{PersistenceServices, PersistentRenderStrategy, RenderStrategyFactory};
pub use page_scope::{PageScope, StateEntry, StateLink, STATE_PARENT_CASCADE, STATE_ROOT_CASCADE};
pub use persistent_strategy::{
    ComponentStateCapability, PageStateCapability, PersistentStateExtension, StateCapability,
};
