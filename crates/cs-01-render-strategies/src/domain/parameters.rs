//! Parameters supplied to a component by its parent.
//!
//! Plain parameters are JSON values keyed by name. Cascading values flow
//! down the tree from an ancestor's cascade scope and are shared by
//! reference. Fragment parameters carry child content.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::render_tree::RenderFragment;
use crate::error::LifecycleError;

/// A value shared with every descendant inside a cascade scope.
pub type CascadingValue = Arc<dyn Any + Send + Sync>;

/// Parameter name conventionally used for child content.
pub const CHILD_CONTENT: &str = "ChildContent";

#[derive(Clone, Default)]
pub struct ParameterView {
    values: BTreeMap<String, Value>,
    cascades: BTreeMap<String, CascadingValue>,
    fragments: BTreeMap<String, RenderFragment>,
}

impl ParameterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with_cascade(mut self, name: impl Into<String>, value: CascadingValue) -> Self {
        self.cascades.insert(name.into(), value);
        self
    }

    pub fn with_fragment(mut self, name: impl Into<String>, fragment: RenderFragment) -> Self {
        self.fragments.insert(name.into(), fragment);
        self
    }

    /// Serialize `value` and store it under `name`.
    pub fn insert<T: Serialize>(&mut self, name: impl Into<String>, value: &T) -> Result<(), LifecycleError> {
        let value = serde_json::to_value(value)
            .map_err(|e| LifecycleError::Component(format!("parameter serialization failed: {e}")))?;
        self.values.insert(name.into(), value);
        Ok(())
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Read a plain parameter as `T`; `Ok(None)` when it was not supplied.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, LifecycleError> {
        self.values
            .get(name)
            .map(|value| {
                T::deserialize(value).map_err(|e| {
                    LifecycleError::Component(format!("parameter '{name}' has the wrong shape: {e}"))
                })
            })
            .transpose()
    }

    /// Look up a cascading value and downcast it to `T`.
    pub fn cascading<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.cascades
            .get(name)
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
    }

    pub fn has_cascade(&self, name: &str) -> bool {
        self.cascades.contains_key(name)
    }

    pub fn fragment(&self, name: &str) -> Option<RenderFragment> {
        self.fragments.get(name).cloned()
    }

    pub fn cascades(&self) -> impl Iterator<Item = (&str, &CascadingValue)> {
        self.cascades.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Fill in cascades from an enclosing scope without overriding explicit ones.
    pub fn inherit_cascades(mut self, scope: &BTreeMap<String, CascadingValue>) -> Self {
        for (name, value) in scope {
            self.cascades
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.cascades.is_empty() && self.fragments.is_empty()
    }

    /// True when nothing observable changed: equal values and the same
    /// cascade and fragment instances.
    pub fn same_as(&self, other: &ParameterView) -> bool {
        self.values == other.values
            && same_keys_by(&self.cascades, &other.cascades, |a, b| {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            })
            && same_keys_by(&self.fragments, &other.fragments, RenderFragment::ptr_eq)
    }
}

fn same_keys_by<V>(
    left: &BTreeMap<String, V>,
    right: &BTreeMap<String, V>,
    eq: impl Fn(&V, &V) -> bool,
) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|((lk, lv), (rk, rv))| lk == rk && eq(lv, rv))
}

impl fmt::Debug for ParameterView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterView")
            .field("values", &self.values)
            .field("cascades", &self.cascades.keys().collect::<Vec<_>>())
            .field("fragments", &self.fragments.keys().collect::<Vec<_>>())
            .finish()
    }
}
