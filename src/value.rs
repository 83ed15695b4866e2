use crate::list::ReactiveList;
use crate::object::ReactiveObject;
use crate::scheduler::RenderHandle;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Render trigger of a root container, shared by every wrapper created under it
pub(crate) type Trigger = Arc<RenderHandle>;

/// Render triggers a wrapper invalidates on every write
///
/// A wrapper starts with the triggers of the container it was read from. When
/// another container stores it (`set_reactive`, `assign_from`) that
/// container's triggers are added, so a write through a shared wrapper
/// re-renders every container holding it.
pub(crate) struct Triggers {
    handles: RwLock<Vec<Trigger>>,
}

impl Triggers {
    pub(crate) fn new(handles: Vec<Trigger>) -> Self {
        Self {
            handles: RwLock::new(handles),
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Trigger> {
        self.handles.read().clone()
    }

    pub(crate) fn invalidate(&self) {
        for handle in self.handles.read().iter() {
            handle.invalidate();
        }
    }

    /// Add `handle`; false if it was already present
    pub(crate) fn insert(&self, handle: &Trigger) -> bool {
        let mut handles = self.handles.write();
        if handles.iter().any(|existing| Arc::ptr_eq(existing, handle)) {
            return false;
        }
        handles.push(Arc::clone(handle));
        true
    }

    /// Add every handle of `new`, returning the ones that were missing
    pub(crate) fn extend(&self, new: &[Trigger]) -> Vec<Trigger> {
        new.iter().filter(|handle| self.insert(handle)).cloned().collect()
    }
}

/// What a read from a reactive container returns
///
/// Nested objects and arrays come back wrapped, so writes through them are
/// observed; everything else comes back as a plain JSON value.
#[derive(Clone, Debug)]
pub enum ReactiveValue {
    /// A scalar (or null) copied out of the container
    Value(Value),
    /// The memoized wrapper of a nested object
    Object(ReactiveObject),
    /// The memoized wrapper of a nested array
    List(ReactiveList),
}

impl ReactiveValue {
    /// The plain value, if this is not a wrapper
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ReactiveValue::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The object wrapper, if this is one
    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            ReactiveValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The list wrapper, if this is one
    pub fn as_list(&self) -> Option<&ReactiveList> {
        match self {
            ReactiveValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Consume into the object wrapper, if this is one
    pub fn into_object(self) -> Option<ReactiveObject> {
        match self {
            ReactiveValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Consume into the list wrapper, if this is one
    pub fn into_list(self) -> Option<ReactiveList> {
        match self {
            ReactiveValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Whether this is a wrapper rather than plain data
    pub fn is_wrapped(&self) -> bool {
        !matches!(self, ReactiveValue::Value(_))
    }
}

impl From<Value> for ReactiveValue {
    fn from(value: Value) -> Self {
        ReactiveValue::Value(value)
    }
}

impl From<ReactiveObject> for ReactiveValue {
    fn from(object: ReactiveObject) -> Self {
        ReactiveValue::Object(object)
    }
}

impl From<ReactiveList> for ReactiveValue {
    fn from(list: ReactiveList) -> Self {
        ReactiveValue::List(list)
    }
}

/// Deep copy into plain JSON, dropping every reactive wrapper on the way
pub trait ToPlain {
    /// Plain JSON snapshot of `self`
    fn to_plain(&self) -> Value;
}

impl ToPlain for Value {
    fn to_plain(&self) -> Value {
        self.clone()
    }
}

impl ToPlain for Map<String, Value> {
    fn to_plain(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl ToPlain for [Value] {
    fn to_plain(&self) -> Value {
        Value::Array(self.to_vec())
    }
}

impl ToPlain for ReactiveValue {
    fn to_plain(&self) -> Value {
        match self {
            ReactiveValue::Value(value) => value.clone(),
            ReactiveValue::Object(object) => object.to_value(),
            ReactiveValue::List(list) => list.to_value(),
        }
    }
}

impl ToPlain for ReactiveObject {
    fn to_plain(&self) -> Value {
        self.to_value()
    }
}

impl ToPlain for ReactiveList {
    fn to_plain(&self) -> Value {
        self.to_value()
    }
}

/// One stored entry of a container's raw data
///
/// Objects and arrays start out as plain JSON. The first read replaces the
/// entry with its wrapper, which owns the child's raw data from then on, so
/// the same entry is never wrapped twice and moving it (sort, splice) moves
/// the wrapper along with it.
#[derive(Clone)]
pub(crate) enum Slot {
    Plain(Value),
    Object(ReactiveObject),
    List(ReactiveList),
}

impl Slot {
    pub(crate) fn from_reactive(value: ReactiveValue) -> Self {
        match value {
            ReactiveValue::Value(value) => Slot::Plain(value),
            ReactiveValue::Object(object) => Slot::Object(object),
            ReactiveValue::List(list) => Slot::List(list),
        }
    }

    /// Whether reading this entry would create a wrapper
    pub(crate) fn needs_wrap(&self) -> bool {
        matches!(self, Slot::Plain(Value::Object(_) | Value::Array(_)))
    }

    /// Read an entry that does not need wrapping
    pub(crate) fn read(&self) -> ReactiveValue {
        match self {
            Slot::Plain(value) => ReactiveValue::Value(value.clone()),
            Slot::Object(object) => ReactiveValue::Object(object.clone()),
            Slot::List(list) => ReactiveValue::List(list.clone()),
        }
    }

    /// Read an entry, wrapping a nested object/array in place on first access
    pub(crate) fn wrap(&mut self, triggers: &Triggers) -> ReactiveValue {
        match self {
            Slot::Plain(Value::Object(map)) => {
                let object =
                    ReactiveObject::with_triggers(std::mem::take(map), triggers.snapshot());
                *self = Slot::Object(object.clone());
                ReactiveValue::Object(object)
            }
            Slot::Plain(Value::Array(items)) => {
                let list = ReactiveList::with_triggers(std::mem::take(items), triggers.snapshot());
                *self = Slot::List(list.clone());
                ReactiveValue::List(list)
            }
            other => other.read(),
        }
    }

    /// Make a stored wrapper (and its wrapped descendants) notify `triggers` too
    pub(crate) fn adopt(&self, triggers: &[Trigger]) {
        match self {
            Slot::Plain(_) => {}
            Slot::Object(object) => object.adopt(triggers),
            Slot::List(list) => list.adopt(triggers),
        }
    }

    /// Deep plain snapshot
    pub(crate) fn to_plain(&self) -> Value {
        match self {
            Slot::Plain(value) => value.clone(),
            Slot::Object(object) => object.to_value(),
            Slot::List(list) => list.to_value(),
        }
    }

    /// Consume into plain data
    pub(crate) fn into_plain(self) -> Value {
        match self {
            Slot::Plain(value) => value,
            Slot::Object(object) => object.to_value(),
            Slot::List(list) => list.to_value(),
        }
    }
}
