//! Domain layer: position identifiers, the state registry, the parsed page
//! state and the per-page state graph. No I/O.

pub mod graph;
pub mod json;
pub mod page_state;
pub mod position;
pub mod registry;

pub use graph::{NodeId, RestoreStatus, StateGraph};
pub use json::{find_property, to_camel_case, CHILD_NODE_PREFIX};
pub use page_state::{PageState, StateNode};
pub use position::{short_type_name, PositionIdentifier};
pub use registry::{
    ComponentStateInfo, ComponentStateRegistry, ComponentStateRegistryBuilder, StateMember,
    StateMembers,
};
