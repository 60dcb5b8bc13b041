//! Component state registry.
//!
//! Each persistent component type declares its state members once, as
//! typed accessor pairs. Registration erases them to JSON readers and
//! writers so the composer and the restore path can work on any component
//! without knowing its type.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::json::to_camel_case;
use super::position::short_type_name;
use crate::error::StateError;
use crate::ports::PersistentComponent;

type Reader = Arc<dyn Fn(&dyn Any) -> Result<Value, StateError> + Send + Sync>;
type Writer = Arc<dyn Fn(&dyn Any, Value) -> Result<(), StateError> + Send + Sync>;

/// One persisted member of a component type.
#[derive(Clone)]
pub struct StateMember {
    name: &'static str,
    wire_name: String,
    owning_type: &'static str,
    value_type: &'static str,
    read: Reader,
    write: Writer,
}

impl StateMember {
    /// Member name as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Key used in the page state blob.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Full type name of the component declaring the member.
    pub fn owning_type(&self) -> &'static str {
        self.owning_type
    }

    /// Full type name of the member value.
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Serialize the member of `component` to JSON.
    ///
    /// Fails with `MemberType` when `component` is not the owning type.
    pub fn read(&self, component: &dyn Any) -> Result<Value, StateError> {
        (self.read)(component)
    }

    /// Deserialize `value` into the member of `component`.
    pub fn write(&self, component: &dyn Any, value: Value) -> Result<(), StateError> {
        (self.write)(component, value)
    }
}

impl fmt::Debug for StateMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMember")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("owning_type", &self.owning_type)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// Collects the state members of `C` during registration.
pub struct StateMembers<C> {
    members: Vec<StateMember>,
    _component: PhantomData<fn(&C)>,
}

impl<C: Any> StateMembers<C> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            _component: PhantomData,
        }
    }

    /// Declare a member with its getter and setter.
    ///
    /// ```rust,ignore
    /// members.member("count", |c: &Counter| *c.count.lock(), |c, v| *c.count.lock() = v);
    /// ```
    pub fn member<T, G, S>(&mut self, name: &'static str, get: G, set: S) -> &mut Self
    where
        T: Serialize + DeserializeOwned + 'static,
        G: Fn(&C) -> T + Send + Sync + 'static,
        S: Fn(&C, T) + Send + Sync + 'static,
    {
        let read: Reader = Arc::new(move |component: &dyn Any| {
            let component = downcast::<C>(component, name)?;
            serde_json::to_value(get(component)).map_err(|e| member_error::<C>(name, e))
        });
        let write: Writer = Arc::new(move |component: &dyn Any, value: Value| {
            let component = downcast::<C>(component, name)?;
            let value = serde_json::from_value::<T>(value).map_err(|e| member_error::<C>(name, e))?;
            set(component, value);
            Ok(())
        });

        self.members.push(StateMember {
            name,
            wire_name: to_camel_case(name),
            owning_type: type_name::<C>(),
            value_type: type_name::<T>(),
            read,
            write,
        });
        self
    }

    /// Number of members declared so far.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when no member was declared.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

fn downcast<'a, C: Any>(component: &'a dyn Any, member: &str) -> Result<&'a C, StateError> {
    component
        .downcast_ref::<C>()
        .ok_or_else(|| StateError::MemberType {
            component: type_name::<C>().to_string(),
            member: member.to_string(),
            reason: "accessor applied to a different component type".to_string(),
        })
}

fn member_error<C>(member: &str, error: serde_json::Error) -> StateError {
    StateError::MemberType {
        component: type_name::<C>().to_string(),
        member: member.to_string(),
        reason: error.to_string(),
    }
}

/// Everything known about one persistent component type.
#[derive(Debug)]
pub struct ComponentStateInfo {
    component_type: &'static str,
    type_id: TypeId,
    members: Vec<StateMember>,
    is_page: bool,
}

impl ComponentStateInfo {
    /// Full type name of the component.
    pub fn component_type(&self) -> &'static str {
        self.component_type
    }

    /// Type name without its module path, used for default position ids.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.component_type)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[StateMember] {
        &self.members
    }

    /// Look up a member by its declared name.
    pub fn member(&self, name: &str) -> Option<&StateMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Routed pages get the page strategy: they own the state tree.
    pub fn is_page(&self) -> bool {
        self.is_page
    }
}

/// Immutable table of registered persistent component types.
///
/// Built once at startup and shared by every strategy through
/// `PersistenceServices`.
#[derive(Debug, Default)]
pub struct ComponentStateRegistry {
    entries: HashMap<TypeId, Arc<ComponentStateInfo>>,
}

impl ComponentStateRegistry {
    /// Start an empty registration.
    pub fn builder() -> ComponentStateRegistryBuilder {
        ComponentStateRegistryBuilder::default()
    }

    /// Descriptor for `C`, or `UnregisteredComponent`.
    pub fn component_state_info<C: Any>(&self) -> Result<Arc<ComponentStateInfo>, StateError> {
        self.by_type_id(TypeId::of::<C>())
            .ok_or_else(|| StateError::UnregisteredComponent(type_name::<C>().to_string()))
    }

    /// Descriptor for an erased component type.
    pub fn by_type_id(&self, type_id: TypeId) -> Option<Arc<ComponentStateInfo>> {
        self.entries.get(&type_id).cloned()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects registrations for a `ComponentStateRegistry`.
#[derive(Default)]
pub struct ComponentStateRegistryBuilder {
    entries: HashMap<TypeId, ComponentStateInfo>,
}

impl ComponentStateRegistryBuilder {
    /// Register a persistent component type.
    ///
    /// Registering a type twice keeps the later registration.
    pub fn register<C: PersistentComponent>(self) -> Self {
        self.insert::<C>(false)
    }

    /// Register a routed page: the root of a state tree.
    ///
    /// Registering a type twice keeps the later registration.
    pub fn register_page<C: PersistentComponent>(self) -> Self {
        self.insert::<C>(true)
    }

    fn insert<C: PersistentComponent>(mut self, is_page: bool) -> Self {
        let mut members = StateMembers::<C>::new();
        C::describe_state(&mut members);
        debug!(
            component = type_name::<C>(),
            members = members.len(),
            is_page,
            "registered persistent component"
        );
        let replaced = self.entries.insert(
            TypeId::of::<C>(),
            ComponentStateInfo {
                component_type: type_name::<C>(),
                type_id: TypeId::of::<C>(),
                members: members.members,
                is_page,
            },
        );
        if let Some(previous) = replaced {
            warn!(
                component = type_name::<C>(),
                was_page = previous.is_page,
                is_page,
                "component registered twice, later registration wins"
            );
        }
        self
    }

    /// Freeze the registrations.
    pub fn build(self) -> ComponentStateRegistry {
        ComponentStateRegistry {
            entries: self
                .entries
                .into_iter()
                .map(|(id, info)| (id, Arc::new(info)))
                .collect(),
        }
    }
}
