//! # Component State (cs-02)
//!
//! Carries component state from the prerender pass into the interactive
//! pass of the same page.
//!
//! ## Responsibilities
//!
//! - Describe persisted members per component type ([`ComponentStateRegistry`])
//! - Compose the page's state tree into a base64 JSON blob emitted with the page
//! - Restore each component from its node on the interactive pass, or fall
//!   back to normal initialization
//!
//! ## Wire Format
//!
//! ```text
//! <script id="page-state" type="text/template">base64(json)</script>
//!
//! {"count":3,"n__Counter":{"value":7}}
//!   └ page members   └ child node keyed by position id
//! ```
//!
//! ## Hexagonal Architecture
//!
//! - **Domain** (`domain/`): position ids, registry, page state, state graph
//! - **Ports** (`ports/`): [`PersistentComponent`], [`DocumentBridge`]
//! - **Service** (`service/`): [`RenderStrategyFactory`], [`StateComposer`], capabilities
//! - **Adapters** (`adapters/`): [`InMemoryDocument`]

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::InMemoryDocument;
pub use config::{PersistenceConfig, DEFAULT_ROOT_RESTORE_TIMEOUT, DEFAULT_STATE_ELEMENT_ID};
pub use domain::{
    ComponentStateInfo, ComponentStateRegistry, ComponentStateRegistryBuilder, NodeId, PageState,
    PositionIdentifier, RestoreStatus, StateGraph, StateMember, StateMembers, StateNode,
};
pub use error::StateError;
pub use ports::{AsAny, DocumentBridge, PersistentComponent};
pub use service::{
    state_element, ComponentStateCapability, PageScope, PageStateCapability, PageStateContainer,
    PersistenceServices, PersistentRenderStrategy, PersistentStateExtension, RenderStrategyFactory,
    StateCapability, StateComposer, StateEntry, StateLink, STATE_PARENT_CASCADE, STATE_ROOT_CASCADE,
};
