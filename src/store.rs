//! Observable state store
//!
//! A [`Store`] owns one state value. Updates apply synchronously; subscribers
//! run on the next frame with the state as it stands then, so a burst of
//! updates in one tick is observed once, in its final form.
//!
//! ```ignore
//! let store = Store::new(Counter { value: 0 });
//! let _sub = store.subscribe(|state| println!("{}", state.value));
//! let _even = store.select(|s| s.value % 2 == 0, |even| println!("even: {even}"));
//!
//! store.update(|s| s.value += 1);
//! store.update(|s| s.value += 1);
//! flush_frame(); // prints "2" once; `even` did not change, so it stays quiet
//! ```

use crate::scheduler::RenderHandle;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

struct StoreInner<S> {
    state: RwLock<S>,
    subscribers: Mutex<Vec<Weak<RenderHandle>>>,
}

/// Shared, observable state value
///
/// Cloning yields another handle to the same store.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Keeps a store subscription alive; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _handle: Arc<RenderHandle>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl<S> Store<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create a store holding `state`
    pub fn new(state: S) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(state),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> S {
        self.inner.state.read().clone()
    }

    /// Read the current state without cloning it
    ///
    /// `f` must not update this store.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.inner.state.read())
    }

    /// Mutate the state and notify subscribers on the next frame
    ///
    /// `f` must not access this store.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = f(&mut *self.inner.state.write());
        self.notify();
        result
    }

    /// Replace the state and notify subscribers on the next frame
    pub fn set(&self, state: S) {
        self.update(|current| *current = state);
    }

    fn notify(&self) {
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|subscriber| match subscriber.upgrade() {
            Some(handle) => {
                handle.invalidate();
                true
            }
            None => false,
        });
    }

    /// Call `callback` with the state on every frame following an update
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&S) + Send + 'static,
    {
        let weak = Arc::downgrade(&self.inner);
        self.register(move || {
            if let Some(inner) = weak.upgrade() {
                let snapshot = inner.state.read().clone();
                callback(&snapshot);
            }
        })
    }

    /// Call `callback` with the selected value whenever it changes
    ///
    /// The selection is compared against the one seen last (initially, the
    /// one at subscription time); unchanged selections are skipped.
    pub fn select<T, Sel, F>(&self, selector: Sel, mut callback: F) -> Subscription
    where
        T: PartialEq + Send + 'static,
        Sel: Fn(&S) -> T + Send + 'static,
        F: FnMut(&T) + Send + 'static,
    {
        let mut last = self.read(&selector);
        let weak = Arc::downgrade(&self.inner);
        self.register(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let selected = selector(&*inner.state.read());
            if selected != last {
                last = selected;
                callback(&last);
            }
        })
    }

    fn register<F>(&self, render: F) -> Subscription
    where
        F: FnMut() + Send + 'static,
    {
        let handle = Arc::new(RenderHandle::new(render));
        self.inner.subscribers.lock().push(Arc::downgrade(&handle));
        Subscription { _handle: handle }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .iter()
            .filter(|subscriber| subscriber.strong_count() > 0)
            .count()
    }
}

impl<S> std::fmt::Debug for Store<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}
