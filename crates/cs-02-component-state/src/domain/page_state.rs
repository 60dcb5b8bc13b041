//! Parsed page state.
//!
//! The blob is a JSON object per component: member properties plus one
//! `n__{id}` key per persisted child. Parsing splits the two apart
//! recursively so components can be found by their position path.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use super::json::CHILD_NODE_PREFIX;
use crate::error::StateError;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateNode {
    id: Option<String>,
    properties: Map<String, Value>,
    children: BTreeMap<String, StateNode>,
}

impl StateNode {
    fn from_object(id: Option<String>, object: Map<String, Value>) -> Result<Self, StateError> {
        let mut properties = Map::new();
        let mut children = BTreeMap::new();

        for (key, value) in object {
            let Some(child_id) = key.strip_prefix(CHILD_NODE_PREFIX) else {
                properties.insert(key, value);
                continue;
            };
            // Unaddressable.
            if child_id.trim().is_empty() {
                continue;
            }
            let Value::Object(child) = value else {
                return Err(StateError::MalformedState(format!(
                    "child node '{child_id}' is not an object"
                )));
            };
            let child_id = child_id.to_string();
            let node = StateNode::from_object(Some(child_id.clone()), child)?;
            children.insert(child_id, node);
        }

        Ok(Self {
            id,
            properties,
            children,
        })
    }

    /// The node's position id; `None` for the root.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn child(&self, id: &str) -> Option<&StateNode> {
        self.children.get(id)
    }

    pub fn children(&self) -> impl Iterator<Item = &StateNode> {
        self.children.values()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    root: StateNode,
}

impl PageState {
    pub fn parse(json: &str) -> Result<Self, StateError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, StateError> {
        match value {
            Value::Object(object) => Ok(Self {
                root: StateNode::from_object(None, object)?,
            }),
            other => Err(StateError::MalformedState(format!(
                "expected a JSON object at the root, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Decode the wire envelope: base64 of UTF-8 JSON.
    pub fn from_base64(encoded: &str) -> Result<Self, StateError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| StateError::Decode(e.to_string()))?;
        let json = String::from_utf8(bytes).map_err(|e| StateError::Decode(e.to_string()))?;
        Self::parse(&json)
    }

    pub fn root(&self) -> &StateNode {
        &self.root
    }

    /// Walk `path` from the root. The empty path is the root itself.
    pub fn node<S: AsRef<str>>(&self, path: &[S]) -> Option<&StateNode> {
        path.iter()
            .try_fold(&self.root, |node, id| node.child(id.as_ref()))
    }

    pub fn get_component_state<S: AsRef<str>>(&self, path: &[S]) -> Option<&Map<String, Value>> {
        self.node(path).map(StateNode::properties)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
