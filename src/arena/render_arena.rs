// Render arena - storage for registered render callbacks
//
// Every reactive container root and every store subscription owns one slot in
// this arena. A slot holds the callback itself plus a dirty flag:
// - dirty == false: nothing changed since the last frame
// - dirty == true: the slot sits in PENDING_RENDERS and runs on the next flush
//
// The dirty flag makes invalidation idempotent: twenty mutations in one tick
// insert the slot into the pending set once and render once.

use crate::hash::FastHashBuilder;
use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use slab::Slab;
use std::cell::Cell;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Boxed render callback as stored in the arena.
pub type RenderCallback = Box<dyn FnMut() + Send>;

/// Global render arena
static RENDER_ARENA: RwLock<Slab<RenderSlot>> = RwLock::new(Slab::new());

// Global set of dirty render ids, in invalidation order.
// Flushing drains it, so a frame is O(k) in the number of dirty slots.
static PENDING_RENDERS: LazyLock<Mutex<IndexSet<RenderId, FastHashBuilder>>> =
    LazyLock::new(|| Mutex::new(IndexSet::default()));

// Render callback currently executing on this thread (if any)
thread_local! {
    static CURRENT_RENDER: Cell<Option<RenderId>> = const { Cell::new(None) };
}

/// Get the render callback executing on this thread (if any)
pub fn current_render() -> Option<RenderId> {
    CURRENT_RENDER.with(Cell::get)
}

fn set_current_render(id: Option<RenderId>) -> Option<RenderId> {
    CURRENT_RENDER.with(|c| c.replace(id))
}

/// RAII guard that restores CURRENT_RENDER when dropped, including on panic.
pub struct CurrentRenderGuard {
    previous: Option<RenderId>,
}

impl CurrentRenderGuard {
    /// Set CURRENT_RENDER to `id` until the guard drops.
    pub fn new(id: Option<RenderId>) -> Self {
        let previous = set_current_render(id);
        Self { previous }
    }
}

impl Drop for CurrentRenderGuard {
    fn drop(&mut self) {
        set_current_render(self.previous);
    }
}

/// Index of a render slot in the arena.
///
/// When the owning [`RenderHandle`](crate::RenderHandle) drops, the slot is
/// removed and this id goes stale. Stale access is a no-op.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RenderId(u32);

impl RenderId {
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Access the slot with a closure. Returns `None` for a stale id.
    fn with<F, R>(self, f: F) -> Option<R>
    where
        F: FnOnce(&RenderSlot) -> R,
    {
        let arena = RENDER_ARENA.read();
        arena.get(self.index()).map(f)
    }

    /// Whether the slot is waiting for the next frame.
    pub fn is_dirty(self) -> bool {
        self.with(|slot| slot.dirty.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(self) -> bool {
        self.with(|slot| slot.dirty.swap(false, Ordering::AcqRel))
            .unwrap_or(false)
    }

    /// Run the callback stored in the arena.
    ///
    /// The arena lock is released while the callback runs: a render may create
    /// or drop containers and subscriptions, which needs the write lock. The
    /// callback is taken out, run, and put back by a drop guard so a panicking
    /// render keeps its slot usable.
    pub fn run_callback(self) {
        struct CallbackGuard {
            id: RenderId,
            callback: Option<RenderCallback>,
        }

        impl Drop for CallbackGuard {
            fn drop(&mut self) {
                if let Some(cb) = self.callback.take() {
                    let arena = RENDER_ARENA.read();
                    if let Some(slot) = arena.get(self.id.index()) {
                        *slot.callback.lock() = Some(cb);
                    }
                }
            }
        }

        let callback = self.with(|slot| slot.callback.lock().take()).flatten();

        if let Some(cb) = callback {
            let mut guard = CallbackGuard {
                id: self,
                callback: Some(cb),
            };
            if let Some(cb) = guard.callback.as_mut() {
                let _current = CurrentRenderGuard::new(Some(self));
                cb();
            }
        }
    }

    /// Whether a callback is present (absent while it is running).
    #[cfg(test)]
    pub fn has_callback(self) -> bool {
        self.with(|slot| slot.callback.lock().is_some())
            .unwrap_or(false)
    }
}

/// One render registration.
pub struct RenderSlot {
    callback: Mutex<Option<RenderCallback>>,
    dirty: AtomicBool,
}

impl RenderSlot {
    /// Create a clean slot for `callback`.
    pub fn new(callback: RenderCallback) -> Self {
        Self {
            callback: Mutex::new(Some(callback)),
            dirty: AtomicBool::new(false),
        }
    }
}

/// Insert a slot into the arena.
pub fn render_arena_insert(slot: RenderSlot) -> RenderId {
    let mut arena = RENDER_ARENA.write();
    let index = arena.insert(slot);
    RenderId(index as u32)
}

/// Remove a slot from the arena and the pending set.
pub fn render_arena_remove(id: RenderId) -> Option<RenderSlot> {
    remove_from_pending_set(id);

    let mut arena = RENDER_ARENA.write();
    if arena.contains(id.index()) {
        Some(arena.remove(id.index()))
    } else {
        None
    }
}

/// Mark a slot dirty and queue it for the next frame.
///
/// Returns true if the slot was newly marked (it was clean before).
pub fn mark_render_pending(id: RenderId) -> bool {
    let was_clean = id
        .with(|slot| !slot.dirty.swap(true, Ordering::AcqRel))
        .unwrap_or(false);

    if was_clean {
        PENDING_RENDERS.lock().insert(id);
    }

    was_clean
}

/// Drain the pending set into `out`, preserving invalidation order.
///
/// `drain(..)` keeps the set's allocation across frames.
pub fn take_pending_renders(out: &mut Vec<RenderId>) {
    let mut pending = PENDING_RENDERS.lock();
    out.extend(pending.drain(..));
}

/// Remove a slot from the pending set (used when the slot is destroyed).
pub fn remove_from_pending_set(id: RenderId) {
    PENDING_RENDERS.lock().shift_remove(&id);
}
