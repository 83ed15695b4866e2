use crate::scheduler::flush_frame;
use parking_lot::{Condvar, Mutex};
use std::cell::Cell;
use std::sync::OnceLock;

// Thread-local batch depth counter
// When > 0, invalidations mark renders dirty but do not request a frame
thread_local! {
    static BATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Global barrier that holds the frame loop back while any thread is batching.
///
/// - A counter of threads with an open batch
/// - A condvar to wake the frame loop when the count drops to zero
static BATCH_BARRIER: OnceLock<BatchBarrier> = OnceLock::new();

struct BatchBarrier {
    active_count: Mutex<usize>,
    condvar: Condvar,
}

impl BatchBarrier {
    fn new() -> Self {
        Self {
            active_count: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    fn enter(&self) {
        let mut count = self.active_count.lock();
        *count += 1;
    }

    fn exit(&self) {
        let mut count = self.active_count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.condvar.notify_all();
        }
    }

    fn wait_until_clear(&self) {
        let mut count = self.active_count.lock();
        while *count > 0 {
            self.condvar.wait(&mut count);
        }
    }
}

fn get_barrier() -> &'static BatchBarrier {
    BATCH_BARRIER.get_or_init(BatchBarrier::new)
}

/// Block until no thread has an open batch.
///
/// Called by the frame loop before flushing so a frame never renders half of a
/// batch.
pub fn wait_for_batches() {
    get_barrier().wait_until_clear();
}

/// Check if a batch is open on this thread
pub fn is_batch_active() -> bool {
    BATCH_DEPTH.with(|d| d.get() > 0)
}

fn enter_batch() {
    BATCH_DEPTH.with(|d| {
        let depth = d.get();
        if depth == 0 {
            get_barrier().enter();
        }
        d.set(depth + 1);
    });
}

fn exit_batch() {
    let outermost = BATCH_DEPTH.with(|d| {
        let depth = d.get().saturating_sub(1);
        d.set(depth);
        depth == 0
    });

    if outermost {
        get_barrier().exit();
        flush_frame();
    }
}

/// Exits the batch on drop, so a panicking closure still releases the barrier.
struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        exit_batch();
    }
}

/// Group several mutations into one frame
///
/// Mutations inside the closure are applied immediately, but their renders are
/// held back until the outermost batch exits and then flushed synchronously.
///
/// # Example
/// ```ignore
/// Batch::run(|| {
///     form.set("name", "Ada");
///     form.set("age", 36);
///     rows.append([json!({"id": 3})]);
/// }); // each affected container renders once, here
/// ```
pub struct Batch;

impl Batch {
    /// Run `f` inside a batch and return its result
    pub fn run<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        enter_batch();
        let _guard = BatchGuard;
        f()
    }
}
