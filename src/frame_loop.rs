//! Background frame loop
//!
//! Hosts without their own event loop can spawn a [`FrameLoop`]: a thread that
//! turns frame requests into frames.
//!
//! ## Architecture
//!
//! 1. `request_frame()` sends a notification over a channel
//! 2. The loop wakes, then debounces: each new notification restarts the wait,
//!    bounded by `max_debounce` (one 16ms frame by default)
//! 3. It waits for open batches on any thread to close
//! 4. It fires due timers, then flushes the frame
//!
//! When a [`TimerQueue`] is attached the loop also wakes at the earliest timer
//! deadline, so toast auto-dismiss works without any other driver.
//!
//! One loop receives frame requests at a time: spawning another replaces it,
//! and [`FrameLoopHandle::stop`] shuts it down.
//!
//! ## Usage
//!
//! ```ignore
//! let timers = store.timers().clone();
//! let frames = FrameLoop::new()
//!     .debounce(Duration::from_millis(2))
//!     .timers(timers)
//!     .spawn();
//!
//! // Or drive frames yourself from an existing event loop
//! timers.run_due();
//! flush_frame();
//! ```

use crate::timer::TimerQueue;
use parking_lot::{Mutex, const_mutex};
use std::sync::mpsc::{self, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use web_time::Instant;

struct Notifier {
    generation: u64,
    sender: Sender<()>,
}

/// Global sender for waking the frame loop.
///
/// Set when `FrameLoop::spawn()` runs and cleared by `FrameLoopHandle::stop()`.
/// While empty, `notify_frame_loop()` is a no-op.
static FRAME_NOTIFIER: Mutex<Option<Notifier>> = const_mutex(None);

static NEXT_GENERATION: Mutex<u64> = const_mutex(0);

/// Wake the frame loop (if one is running).
///
/// Non-blocking and safe to call from any thread.
pub fn notify_frame_loop() {
    if let Some(notifier) = FRAME_NOTIFIER.lock().as_ref() {
        // Send error means the loop has stopped
        let _ = notifier.sender.send(());
    }
}

/// Default debounce delay after a frame request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(4);

/// Upper bound on debouncing: one frame at 60fps.
pub const DEFAULT_MAX_DEBOUNCE: Duration = Duration::from_millis(16);

type SpawnFn = Box<dyn FnOnce(Box<dyn FnOnce() + Send>) -> JoinHandle<()> + Send>;

/// Builder for the background frame loop.
///
/// # Example
///
/// ```ignore
/// FrameLoop::new()
///     .max_debounce(Duration::from_millis(8))
///     .spawn_fn(|f| {
///         std::thread::Builder::new()
///             .name("ui-frames".into())
///             .spawn(f)
///             .expect("spawn frame loop")
///     })
///     .spawn();
/// ```
pub struct FrameLoop {
    debounce: Duration,
    max_debounce: Duration,
    timers: Option<TimerQueue>,
    spawn_fn: Option<SpawnFn>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    /// Create a builder with default settings.
    ///
    /// - `debounce`: 4ms
    /// - `max_debounce`: 16ms
    /// - `timers`: none
    /// - `spawn_fn`: `std::thread::spawn`
    pub fn new() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_debounce: DEFAULT_MAX_DEBOUNCE,
            timers: None,
            spawn_fn: None,
        }
    }

    /// Set the debounce delay.
    ///
    /// New requests during this period restart it, up to `max_debounce`.
    pub fn debounce(mut self, duration: Duration) -> Self {
        self.debounce = duration;
        self
    }

    /// Set the maximum time a frame may be held back by debouncing.
    pub fn max_debounce(mut self, duration: Duration) -> Self {
        self.max_debounce = duration;
        self
    }

    /// Fire this queue's due timers before each frame.
    ///
    /// The loop sleeps in real time until the earliest deadline, so a queue on
    /// a [`ManualClock`](crate::ManualClock) only fires when the loop wakes for
    /// another reason after the clock was advanced. Drive such queues with
    /// [`TimerQueue::run_due`] instead.
    pub fn timers(mut self, timers: TimerQueue) -> Self {
        self.timers = Some(timers);
        self
    }

    /// Set a custom thread spawning function (name, stack size, priority).
    pub fn spawn_fn<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Box<dyn FnOnce() + Send>) -> JoinHandle<()> + Send + 'static,
    {
        self.spawn_fn = Some(Box::new(f));
        self
    }

    /// Spawn the loop and return a handle that can stop it.
    ///
    /// A loop already running is replaced and exits. While nothing is pending
    /// and no timer is armed the loop blocks on its channel. Dropping the
    /// handle leaves the loop running.
    pub fn spawn(self) -> FrameLoopHandle {
        let (tx, rx) = mpsc::channel::<()>();

        let generation = {
            let mut next = NEXT_GENERATION.lock();
            *next += 1;
            *next
        };
        let replaced = FRAME_NOTIFIER.lock().replace(Notifier {
            generation,
            sender: tx,
        });
        if replaced.is_some() {
            tracing::debug!("replacing the running frame loop");
        }

        let debounce = self.debounce;
        let max_debounce = self.max_debounce;
        let timers = self.timers;

        let loop_fn: Box<dyn FnOnce() + Send> = Box::new(move || {
            frame_loop(rx, debounce, max_debounce, timers);
        });

        let thread = match self.spawn_fn {
            Some(spawn_fn) => spawn_fn(loop_fn),
            None => thread::spawn(loop_fn),
        };
        FrameLoopHandle { generation, thread }
    }
}

/// Handle to a spawned [`FrameLoop`]
#[derive(Debug)]
pub struct FrameLoopHandle {
    generation: u64,
    thread: JoinHandle<()>,
}

impl FrameLoopHandle {
    /// Whether this loop still receives frame requests
    pub fn is_current(&self) -> bool {
        FRAME_NOTIFIER
            .lock()
            .as_ref()
            .is_some_and(|notifier| notifier.generation == self.generation)
    }

    /// Stop receiving frame requests and wait for the loop thread to exit
    ///
    /// A frame already being flushed finishes first.
    pub fn stop(self) -> std::thread::Result<()> {
        {
            let mut notifier = FRAME_NOTIFIER.lock();
            if notifier
                .as_ref()
                .is_some_and(|current| current.generation == self.generation)
            {
                // Dropping the sender disconnects the loop's channel
                notifier.take();
            }
        }
        self.thread.join()
    }
}

/// Wait for a notification or the next timer deadline.
///
/// Returns `None` when the channel has closed, otherwise whether a frame
/// request (as opposed to a timer deadline) woke the loop.
fn wait_for_work(rx: &mpsc::Receiver<()>, timers: Option<&TimerQueue>) -> Option<bool> {
    let deadline = timers.and_then(TimerQueue::next_deadline);
    match deadline {
        None => rx.recv().ok().map(|()| true),
        Some(deadline) => {
            let now = timers.map_or_else(Instant::now, TimerQueue::now);
            let timeout = deadline.saturating_duration_since(now);
            match rx.recv_timeout(timeout) {
                Ok(()) => Some(true),
                Err(RecvTimeoutError::Timeout) => Some(false),
                Err(RecvTimeoutError::Disconnected) => None,
            }
        }
    }
}

fn frame_loop(
    rx: mpsc::Receiver<()>,
    debounce: Duration,
    max_debounce: Duration,
    timers: Option<TimerQueue>,
) {
    loop {
        let Some(requested) = wait_for_work(&rx, timers.as_ref()) else {
            break;
        };

        if requested {
            // Debounce: each notification restarts the wait, bounded by max_debounce
            let debounce_start = Instant::now();
            loop {
                let elapsed = debounce_start.elapsed();
                if elapsed >= max_debounce {
                    break;
                }
                let timeout = debounce.min(max_debounce.saturating_sub(elapsed));

                match rx.recv_timeout(timeout) {
                    Ok(()) => {}
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }

            // Drain notifications that arrived during debounce
            loop {
                match rx.try_recv() {
                    Ok(()) => continue,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
        }

        crate::batch::wait_for_batches();

        if let Some(timers) = &timers {
            timers.run_due();
        }

        crate::scheduler::flush_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::object::ReactiveObject;
    use crate::ui::{ToastOptions, UiStore};
    use serde_json::json;
    use serial_test::serial;

    const WAIT: Duration = Duration::from_secs(5);

    fn spawn_test_loop(timers: TimerQueue) -> FrameLoopHandle {
        FrameLoop::new()
            .debounce(Duration::from_millis(1))
            .max_debounce(Duration::from_millis(4))
            .timers(timers)
            .spawn_fn(|f| {
                thread::Builder::new()
                    .name("test-frames".into())
                    .spawn(f)
                    .unwrap()
            })
            .spawn()
    }

    #[test]
    #[serial]
    fn mutation_renders_without_manual_flush() {
        let frames = spawn_test_loop(TimerQueue::new());
        assert!(frames.is_current());

        let (tx, rx) = mpsc::channel();
        let state = ReactiveObject::new(json!({"n": 0}), move || {
            let _ = tx.send(());
        });
        state.set("n", 1);
        state.set("n", 2);

        assert_eq!(rx.recv_timeout(WAIT), Ok(()));
        assert_eq!(state.get_value("n"), Some(json!(2)));

        frames.stop().unwrap();
    }

    #[test]
    #[serial]
    fn attached_timers_dismiss_toasts() {
        let timers = TimerQueue::new();
        let frames = spawn_test_loop(timers.clone());

        let ui = UiStore::with_timers(UiConfig::default(), timers);
        let (tx, rx) = mpsc::channel();
        let _visible = ui.select(
            |state| state.toast.visible,
            move |visible| {
                let _ = tx.send(*visible);
            },
        );

        ui.request_toast("Saved", ToastOptions::new().duration_ms(200));
        assert_eq!(rx.recv_timeout(WAIT), Ok(true));
        assert_eq!(rx.recv_timeout(WAIT), Ok(false));
        assert!(ui.timers().is_empty());

        frames.stop().unwrap();
    }

    #[test]
    #[serial]
    fn spawning_again_replaces_the_loop() {
        let first = spawn_test_loop(TimerQueue::new());
        let second = spawn_test_loop(TimerQueue::new());
        assert!(!first.is_current());
        assert!(second.is_current());

        // The replaced loop saw its channel close and exited
        first.stop().unwrap();
        second.stop().unwrap();

        let (tx, rx) = mpsc::channel();
        let state = ReactiveObject::new(json!({}), move || {
            let _ = tx.send(());
        });
        state.set("n", 1);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        crate::scheduler::flush_frame();
        assert_eq!(rx.try_recv(), Ok(()));
    }
}
