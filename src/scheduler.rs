use crate::arena::{
    RenderId, RenderSlot, current_render, mark_render_pending, render_arena_insert,
    render_arena_remove, take_pending_renders,
};
use crate::batch::is_batch_active;
use parking_lot::Mutex;
use std::cell::Cell;
use std::sync::LazyLock;

// Thread-local flag tracking whether a frame has been requested.
// Multiple requests before a flush collapse into one frame.
thread_local! {
    static FRAME_REQUESTED: Cell<bool> = const { Cell::new(false) };
}

type AfterFrameTask = Box<dyn FnOnce() + Send>;

// Tasks queued to run once the next frame's renders are done.
static AFTER_FRAME: LazyLock<Mutex<Vec<AfterFrameTask>>> = LazyLock::new(|| Mutex::new(Vec::new()));

/// Request a frame without rendering anything yet
///
/// Renders actually run when:
/// - `flush_frame()` is called by the host event loop
/// - the outermost [`Batch`](crate::Batch) exits
/// - the background [`FrameLoop`](crate::FrameLoop) wakes up (if spawned)
///
/// Mutating a reactive container calls this for you.
pub fn request_frame() {
    FRAME_REQUESTED.with(|requested| requested.set(true));

    crate::frame_loop::notify_frame_loop();
}

/// Check whether a frame has been requested on this thread and not flushed yet
///
/// The flag is per thread. Only a `flush_frame()` on the requesting thread
/// clears it; frames flushed elsewhere, such as by a [`FrameLoop`](crate::FrameLoop)
/// thread, leave it set. Use [`RenderHandle::is_pending`] to ask whether a
/// particular render still has to run.
pub fn is_frame_requested() -> bool {
    FRAME_REQUESTED.with(Cell::get)
}

/// Queue a task to run after the next frame's renders
///
/// Used for work that must observe the rendered result of a state change, such
/// as moving focus back once a dialog has been hidden.
pub fn after_frame<F>(task: F)
where
    F: FnOnce() + Send + 'static,
{
    AFTER_FRAME.lock().push(Box::new(task));
    request_frame();
}

/// Run every pending render once, then the after-frame tasks
///
/// Returns the number of render callbacks run.
///
/// Renders that mutate reactive state during this flush are not re-entered;
/// their changes request the next frame instead.
///
/// # Example
///
/// ```ignore
/// loop {
///     handle_events();
///     timers.run_due();
///     flush_frame();
/// }
/// ```
pub fn flush_frame() -> usize {
    FRAME_REQUESTED.with(|requested| requested.set(false));

    let mut pending = Vec::new();
    take_pending_renders(&mut pending);

    let mut rendered = 0;
    for id in pending {
        // A slot dropped or already rendered since it was queued is skipped
        if id.take_dirty() {
            id.run_callback();
            rendered += 1;
        }
    }

    let tasks = std::mem::take(&mut *AFTER_FRAME.lock());
    let task_count = tasks.len();
    for task in tasks {
        task();
    }

    if rendered > 0 || task_count > 0 {
        tracing::trace!(rendered, after_frame = task_count, "frame flushed");
    }

    rendered
}

/// Owner of one render callback in the scheduler
///
/// The callback does not run on creation. Each [`invalidate`](Self::invalidate)
/// marks it dirty; the next frame runs it once, however many invalidations
/// happened in between. Dropping the handle unregisters the callback.
///
/// # Example
///
/// ```ignore
/// let handle = RenderHandle::new(|| println!("render"));
/// handle.invalidate();
/// handle.invalidate();
/// flush_frame(); // prints once
/// ```
pub struct RenderHandle {
    id: RenderId,
}

impl RenderHandle {
    /// Register `callback` with the scheduler
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let id = render_arena_insert(RenderSlot::new(Box::new(callback)));
        Self { id }
    }

    /// Mark the callback dirty and request a frame
    ///
    /// Inside a [`Batch`](crate::Batch) the frame request is deferred to the
    /// outermost batch exit.
    pub fn invalidate(&self) {
        let newly_dirty = mark_render_pending(self.id);

        if newly_dirty && current_render() == Some(self.id) {
            tracing::trace!(id = ?self.id, "render invalidated itself; deferring to next frame");
        }

        if !is_batch_active() {
            request_frame();
        }
    }

    /// Whether this callback is waiting for the next frame
    pub fn is_pending(&self) -> bool {
        self.id.is_dirty()
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        render_arena_remove(self.id);
    }
}

impl std::fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}
