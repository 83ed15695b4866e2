use crate::error::{ReactiveError, json_kind};
use crate::scheduler::RenderHandle;
use crate::value::{ReactiveValue, Slot, ToPlain, Trigger, Triggers};
use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key/value container whose writes schedule a re-render
///
/// Reads pass straight through. Every write (`set`, `remove`, the assigns, and
/// any write through a nested wrapper obtained from [`get`](Self::get)) updates
/// the raw data immediately and invalidates the render callback, which then
/// runs once on the next frame no matter how many writes happened.
///
/// Cloning is cheap and yields the same container; use [`ptr_eq`](Self::ptr_eq)
/// to compare identities.
///
/// # Example
///
/// ```ignore
/// let form = ReactiveObject::new(json!({"count": 0, "user": {"name": "Ada"}}), render);
///
/// form.update("count", |n| json!(n.and_then(Value::as_i64).unwrap_or(0) + 1));
///
/// let user = form.get("user").and_then(ReactiveValue::into_object).unwrap();
/// user.set("name", "Grace"); // re-renders `form`'s owner
/// ```
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    raw: RwLock<IndexMap<String, Slot>>,
    triggers: Triggers,
}

impl ReactiveObject {
    /// Wrap `initial` and call `on_change` on the frame after each mutation
    ///
    /// `initial` must be a JSON object. Anything else trips a debug assertion;
    /// release builds log a warning and start from an empty object.
    pub fn new<F>(initial: Value, on_change: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        match initial {
            Value::Object(map) => Self::from_map(map, on_change),
            other => {
                debug_assert!(
                    false,
                    "ReactiveObject::new needs a JSON object, got {}",
                    json_kind(&other)
                );
                tracing::warn!(
                    found = json_kind(&other),
                    "reactive object created from a non-object; starting empty"
                );
                Self::from_map(Map::new(), on_change)
            }
        }
    }

    /// Like [`new`](Self::new), but rejects a non-object `initial`
    pub fn try_new<F>(initial: Value, on_change: F) -> Result<Self, ReactiveError>
    where
        F: FnMut() + Send + 'static,
    {
        match initial {
            Value::Object(map) => Ok(Self::from_map(map, on_change)),
            other => Err(ReactiveError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    /// Wrap a JSON map
    pub fn from_map<F>(map: Map<String, Value>, on_change: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::with_triggers(map, vec![Arc::new(RenderHandle::new(on_change))])
    }

    pub(crate) fn with_triggers(map: Map<String, Value>, triggers: Vec<Trigger>) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                raw: RwLock::new(plain_entries(map)),
                triggers: Triggers::new(triggers),
            }),
        }
    }

    fn notify(&self) {
        self.inner.triggers.invalidate();
    }

    pub(crate) fn adopt(&self, triggers: &[Trigger]) {
        let added = self.inner.triggers.extend(triggers);
        if added.is_empty() {
            return;
        }
        for slot in self.inner.raw.read().values() {
            slot.adopt(&added);
        }
    }

    /// Read a key
    ///
    /// Nested objects and arrays are wrapped on first read; later reads of the
    /// same key return the identical wrapper until the key is reassigned.
    pub fn get(&self, key: &str) -> Option<ReactiveValue> {
        let raw = self.inner.raw.upgradable_read();
        match raw.get(key) {
            None => return None,
            Some(slot) if !slot.needs_wrap() => return Some(slot.read()),
            Some(_) => {}
        }

        let mut raw = RwLockUpgradableReadGuard::upgrade(raw);
        raw.get_mut(key).map(|slot| slot.wrap(&self.inner.triggers))
    }

    /// Plain snapshot of a key's value
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.inner.raw.read().get(key).map(Slot::to_plain)
    }

    /// Read a key as a typed value
    ///
    /// Returns `Ok(None)` if the key is absent.
    pub fn get_as<T>(&self, key: &str) -> Result<Option<T>, ReactiveError>
    where
        T: DeserializeOwned,
    {
        self.get_value(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(ReactiveError::from)
    }

    /// Write a key
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.set_reactive(key, ReactiveValue::Value(value.into()));
    }

    /// Write a key, storing an existing wrapper as-is
    ///
    /// The wrapper is shared, not copied: writes through it re-render both
    /// this container and the one it was read from.
    pub fn set_reactive(&self, key: impl Into<String>, value: ReactiveValue) {
        let slot = Slot::from_reactive(value);
        slot.adopt(&self.inner.triggers.snapshot());
        self.inner.raw.write().insert(key.into(), slot);
        self.notify();
    }

    /// Read-modify-write a key
    ///
    /// `f` receives a plain snapshot of the current value (`None` if absent).
    pub fn update<F>(&self, key: &str, f: F)
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let current = self.get_value(key);
        let next = f(current.as_ref());
        self.set(key, next);
    }

    /// Delete a key, returning its plain value
    ///
    /// Remaining keys keep their order.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.raw.write().shift_remove(key);
        self.notify();
        removed.map(Slot::into_plain)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.raw.read().contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.inner.raw.read().keys().cloned().collect()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.inner.raw.read().len()
    }

    /// Whether there are no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every key with the entries of a plain JSON object
    ///
    /// Keys absent from `source` are removed. A `source` that is not an object
    /// clears this one.
    pub fn assign(&self, source: Value) {
        let entries = match source {
            Value::Object(map) => plain_entries(map),
            other => {
                tracing::warn!(
                    found = json_kind(&other),
                    "assign source is not an object; clearing"
                );
                IndexMap::new()
            }
        };
        *self.inner.raw.write() = entries;
        self.notify();
    }

    /// Shallow-replace every key with another container's
    ///
    /// Keys absent from `source` are removed. Nested wrappers already created
    /// in `source` are shared: a write through one re-renders both containers.
    pub fn assign_from(&self, source: &ReactiveObject) {
        let entries: IndexMap<String, Slot> = source.inner.raw.read().clone();
        let triggers = self.inner.triggers.snapshot();
        for slot in entries.values() {
            slot.adopt(&triggers);
        }
        *self.inner.raw.write() = entries;
        self.notify();
    }

    /// Replace every key with a deep plain copy of `source`
    ///
    /// Any wrapper inside `source` is flattened to plain data first, so nothing
    /// is shared afterwards. A `source` that is not an object clears this one.
    pub fn assign_deep<S>(&self, source: &S)
    where
        S: ToPlain + ?Sized,
    {
        let entries = match source.to_plain() {
            Value::Object(map) => plain_entries(map),
            other => {
                tracing::warn!(
                    found = json_kind(&other),
                    "assign_deep source is not an object; clearing"
                );
                IndexMap::new()
            }
        };
        *self.inner.raw.write() = entries;
        self.notify();
    }

    /// Deep plain snapshot of the raw data
    pub fn to_value(&self) -> Value {
        let raw = self.inner.raw.read();
        Value::Object(
            raw.iter()
                .map(|(key, slot)| (key.clone(), slot.to_plain()))
                .collect(),
        )
    }

    /// Whether two handles are the same container
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

fn plain_entries(map: Map<String, Value>) -> IndexMap<String, Slot> {
    map.into_iter()
        .map(|(key, value)| (key, Slot::Plain(value)))
        .collect()
}

impl std::fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReactiveObject")
            .field(&self.to_value())
            .finish()
    }
}
