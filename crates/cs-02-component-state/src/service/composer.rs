//! State composer: turns a page's state graph into the JSON blob.
//!
//! Each node contributes its members under camelCase keys, nulls omitted,
//! followed by one `n__{position}` entry per child whose subtree is not
//! empty. A page with no state at all produces no blob.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::trace;

use super::page_scope::{PageScope, StateEntry};
use crate::domain::{NodeId, StateGraph};
use crate::error::StateError;

#[derive(Debug, Clone, Copy, Default)]
pub struct StateComposer;

impl StateComposer {
    pub fn new() -> Self {
        Self
    }

    /// UTF-8 JSON bytes of the page's state, or `None` when nothing is stored.
    pub fn serialize_state(&self, scope: &PageScope) -> Result<Option<Vec<u8>>, StateError> {
        let composed = scope.with_graph(|graph| self.compose(graph))?;
        composed
            .map(|object| serde_json::to_vec(&Value::Object(object)).map_err(StateError::from))
            .transpose()
    }

    pub fn compose(&self, graph: &StateGraph<StateEntry>) -> Result<Option<Map<String, Value>>, StateError> {
        self.compose_node(graph, NodeId::ROOT)
    }

    fn compose_node(
        &self,
        graph: &StateGraph<StateEntry>,
        node: NodeId,
    ) -> Result<Option<Map<String, Value>>, StateError> {
        let mut object = Map::new();

        if let Some(entry) = graph.entry(node) {
            let component = (*entry.component).as_any();
            for member in entry.info.members() {
                let value = member.read(component)?;
                if !value.is_null() {
                    object.insert(member.wire_name().to_string(), value);
                }
            }
        }

        let mut seen = HashSet::new();
        for &child in graph.children(node) {
            let Some(position) = graph.position(child) else {
                continue;
            };
            if !seen.insert(position.clone()) {
                return Err(StateError::DuplicatePositionIdentifier {
                    parent: describe(graph, node),
                    id: position.to_string(),
                });
            }
            if let Some(subtree) = self.compose_node(graph, child)? {
                object.insert(position.node_key(), Value::Object(subtree));
            }
        }

        trace!(?node, keys = object.len(), "composed state node");
        Ok((!object.is_empty()).then_some(object))
    }
}

fn describe(graph: &StateGraph<StateEntry>, node: NodeId) -> String {
    let type_name = graph
        .entry(node)
        .map(|entry| entry.info.short_name())
        .unwrap_or("?");
    let path = graph.path(node);
    if path.is_empty() {
        format!("page {type_name}")
    } else {
        let path: Vec<_> = path.iter().map(|p| p.as_str()).collect();
        format!("{type_name} at /{}", path.join("/"))
    }
}
