use std::fmt;

use super::json::CHILD_NODE_PREFIX;
use crate::error::StateError;

/// Key identifying a component among its siblings in the state tree.
///
/// An explicit state id wins; otherwise the short type name is used, so two
/// sibling instances of one type need explicit ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionIdentifier(String);

impl PositionIdentifier {
    pub fn resolve(state_id: Option<&str>, type_name: &str) -> Result<Self, StateError> {
        match state_id {
            Some(id) => Self::from_state_id(id),
            None => Ok(Self::from_type_name(type_name)),
        }
    }

    pub fn from_state_id(state_id: &str) -> Result<Self, StateError> {
        if state_id.trim().is_empty() {
            return Err(StateError::InvalidPositionIdentifier);
        }
        Ok(Self(state_id.to_string()))
    }

    /// `app::pages::Counter` → `Counter`, `app::List<app::Item>` → `List`.
    pub fn from_type_name(type_name: &str) -> Self {
        Self(short_type_name(type_name).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this position's child node in its parent's JSON object.
    pub fn node_key(&self) -> String {
        format!("{CHILD_NODE_PREFIX}{}", self.0)
    }
}

impl fmt::Display for PositionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PositionIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn short_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}
