use crate::error::{ReactiveError, json_kind};
use crate::scheduler::RenderHandle;
use crate::value::{ReactiveValue, Slot, Trigger, Triggers};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Farthest `set` may write past the end; larger gaps are ignored
pub const MAX_SET_PADDING: usize = 1 << 16;

/// Ordered container whose mutations schedule a re-render
///
/// The mutating operations mirror the native array methods (`push`, `pop`,
/// `shift`, `unshift`, `splice`, `sort`, `reverse`) and return what those
/// would return. Object and array elements are wrapped on first access and
/// keep their wrapper when they move.
///
/// # Example
///
/// ```ignore
/// let rows = ReactiveList::new(json!([{"id": 1}]), render);
/// assert_eq!(rows.append([json!({"id": 2})]), 2);
/// rows.remove_first();
/// assert_eq!(rows.to_value(), json!([{"id": 2}]));
/// ```
#[derive(Clone)]
pub struct ReactiveList {
    inner: Arc<ListInner>,
}

struct ListInner {
    raw: RwLock<Vec<Slot>>,
    triggers: Triggers,
}

impl ReactiveList {
    /// Wrap `initial` and call `on_change` on the frame after each mutation
    ///
    /// `initial` must be a JSON array. Anything else trips a debug assertion;
    /// release builds log a warning and start from an empty list.
    pub fn new<F>(initial: Value, on_change: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        match initial {
            Value::Array(items) => Self::from_vec(items, on_change),
            other => {
                debug_assert!(
                    false,
                    "ReactiveList::new needs a JSON array, got {}",
                    json_kind(&other)
                );
                tracing::warn!(
                    found = json_kind(&other),
                    "reactive list created from a non-array; starting empty"
                );
                Self::from_vec(Vec::new(), on_change)
            }
        }
    }

    /// Like [`new`](Self::new), but rejects a non-array `initial`
    pub fn try_new<F>(initial: Value, on_change: F) -> Result<Self, ReactiveError>
    where
        F: FnMut() + Send + 'static,
    {
        match initial {
            Value::Array(items) => Ok(Self::from_vec(items, on_change)),
            other => Err(ReactiveError::NotAList {
                found: json_kind(&other),
            }),
        }
    }

    /// Wrap a vector of JSON values
    pub fn from_vec<F>(items: Vec<Value>, on_change: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::with_triggers(items, vec![Arc::new(RenderHandle::new(on_change))])
    }

    pub(crate) fn with_triggers(items: Vec<Value>, triggers: Vec<Trigger>) -> Self {
        Self {
            inner: Arc::new(ListInner {
                raw: RwLock::new(items.into_iter().map(Slot::Plain).collect()),
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
        for slot in self.inner.raw.read().iter() {
            slot.adopt(&added);
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.inner.raw.read().len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an element; `None` past the end
    ///
    /// Object and array elements come back as their memoized wrapper.
    pub fn get(&self, index: usize) -> Option<ReactiveValue> {
        let raw = self.inner.raw.upgradable_read();
        match raw.get(index) {
            None => return None,
            Some(slot) if !slot.needs_wrap() => return Some(slot.read()),
            Some(_) => {}
        }

        let mut raw = RwLockUpgradableReadGuard::upgrade(raw);
        raw.get_mut(index).map(|slot| slot.wrap(&self.inner.triggers))
    }

    /// Plain snapshot of an element
    pub fn get_value(&self, index: usize) -> Option<Value> {
        self.inner.raw.read().get(index).map(Slot::to_plain)
    }

    /// Read an element as a typed value
    pub fn get_as<T>(&self, index: usize) -> Result<Option<T>, ReactiveError>
    where
        T: DeserializeOwned,
    {
        self.get_value(index)
            .map(serde_json::from_value)
            .transpose()
            .map_err(ReactiveError::from)
    }

    /// Write an element
    ///
    /// Writing past the end fills the gap with `null`. An index more than
    /// [`MAX_SET_PADDING`] past the end is ignored with a warning.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        self.set_reactive(index, ReactiveValue::Value(value.into()));
    }

    /// Write an element, storing an existing wrapper as-is
    ///
    /// The wrapper is shared, not copied: writes through it re-render both
    /// this list and the container it was read from.
    pub fn set_reactive(&self, index: usize, value: ReactiveValue) {
        let slot = Slot::from_reactive(value);
        slot.adopt(&self.inner.triggers.snapshot());
        {
            let mut raw = self.inner.raw.write();
            if index >= raw.len() {
                let padded_len = index
                    .checked_add(1)
                    .filter(|len| len - raw.len() <= MAX_SET_PADDING);
                let Some(padded_len) = padded_len else {
                    tracing::warn!(index, len = raw.len(), "list write too far past the end ignored");
                    return;
                };
                raw.resize_with(padded_len, || Slot::Plain(Value::Null));
            }
            raw[index] = slot;
        }
        self.notify();
    }

    /// Push items to the end; returns the new length
    pub fn append<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = Value>,
    {
        let len = {
            let mut raw = self.inner.raw.write();
            raw.extend(items.into_iter().map(Slot::Plain));
            raw.len()
        };
        self.notify();
        len
    }

    /// Pop the last element
    pub fn remove_last(&self) -> Option<Value> {
        let removed = self.inner.raw.write().pop();
        self.notify();
        removed.map(Slot::into_plain)
    }

    /// Shift the first element off
    pub fn remove_first(&self) -> Option<Value> {
        let removed = {
            let mut raw = self.inner.raw.write();
            if raw.is_empty() {
                None
            } else {
                Some(raw.remove(0))
            }
        };
        self.notify();
        removed.map(Slot::into_plain)
    }

    /// Insert items at the front, keeping their order; returns the new length
    pub fn insert_first<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = Value>,
    {
        let len = {
            let mut raw = self.inner.raw.write();
            raw.splice(0..0, items.into_iter().map(Slot::Plain));
            raw.len()
        };
        self.notify();
        len
    }

    /// Remove `delete_count` elements at `start`, insert `items` there, and
    /// return the removed elements
    ///
    /// `start` past the end is clamped to the end, and `delete_count` to the
    /// elements available.
    pub fn splice_at<I>(&self, start: usize, delete_count: usize, items: I) -> Vec<Value>
    where
        I: IntoIterator<Item = Value>,
    {
        let removed: Vec<Slot> = {
            let mut raw = self.inner.raw.write();
            let start = start.min(raw.len());
            let end = start.saturating_add(delete_count).min(raw.len());
            raw.splice(start..end, items.into_iter().map(Slot::Plain))
                .collect()
        };
        self.notify();
        removed.into_iter().map(Slot::into_plain).collect()
    }

    /// Stable in-place sort
    ///
    /// The comparator sees elements as [`get`](Self::get) would return them.
    /// It must not access this list.
    pub fn sort_by<F>(&self, mut compare: F) -> &Self
    where
        F: FnMut(&ReactiveValue, &ReactiveValue) -> Ordering,
    {
        {
            let mut raw = self.inner.raw.write();
            for slot in raw.iter_mut() {
                slot.wrap(&self.inner.triggers);
            }
            raw.sort_by(|a, b| compare(&a.read(), &b.read()));
        }
        self.notify();
        self
    }

    /// Reverse in place
    pub fn reverse_in_place(&self) -> &Self {
        self.inner.raw.write().reverse();
        self.notify();
        self
    }

    /// Visit every element as [`get`](Self::get) would return it, then
    /// request a single render for the whole pass
    ///
    /// The callback runs without any lock held, so it may write through the
    /// wrappers it receives.
    pub fn for_each_wrapped<F>(&self, mut callback: F)
    where
        F: FnMut(ReactiveValue, usize),
    {
        for (index, value) in self.values().into_iter().enumerate() {
            callback(value, index);
        }
        self.notify();
    }

    /// Every element as [`get`](Self::get) would return it
    pub fn values(&self) -> Vec<ReactiveValue> {
        let mut raw = self.inner.raw.write();
        raw.iter_mut()
            .map(|slot| slot.wrap(&self.inner.triggers))
            .collect()
    }

    /// Deep plain snapshot of the raw data
    pub fn to_value(&self) -> Value {
        Value::Array(self.inner.raw.read().iter().map(Slot::to_plain).collect())
    }

    /// Whether two handles are the same container
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for ReactiveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReactiveList").field(&self.to_value()).finish()
    }
}
