//! One-shot timers over a pluggable clock
//!
//! The UI store arms at most one toast auto-dismiss timer at a time, but the
//! queue is general: any number of cancellable one-shot tasks, fired by
//! [`TimerQueue::run_due`] from the host event loop or from the
//! [`FrameLoop`](crate::FrameLoop).
//!
//! ```ignore
//! let clock = ManualClock::new();
//! let timers = TimerQueue::with_clock(clock.clone());
//! let id = timers.schedule(Duration::from_millis(500), || println!("fired"));
//!
//! clock.advance(Duration::from_millis(499));
//! assert_eq!(timers.run_due(), 0);
//! clock.advance(Duration::from_millis(1));
//! assert_eq!(timers.run_due(), 1);
//! ```

use parking_lot::Mutex;
use slab::Slab;
use std::sync::Arc;
use std::time::Duration;
use web_time::Instant;

/// Source of the current time for a [`TimerQueue`]
pub trait Clock: Send + Sync {
    /// The current instant
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// Cloning shares the same time source.
#[derive(Clone, Debug)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

#[derive(Debug)]
struct ManualClockInner {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManualClockInner {
                origin: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
            }),
        }
    }

    /// Move the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        *self.inner.elapsed.lock() += by;
    }

    /// Set the time elapsed since the clock was created
    pub fn set_elapsed(&self, elapsed: Duration) {
        *self.inner.elapsed.lock() = elapsed;
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        *self.inner.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.origin + *self.inner.elapsed.lock()
    }
}

/// Handle to a scheduled timer
///
/// Carries the slot generation, so cancelling an id whose timer already fired
/// never touches a newer timer that reused the slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TimerId {
    key: usize,
    generation: u64,
}

type TimerTask = Box<dyn FnOnce() + Send>;

struct TimerEntry {
    deadline: Instant,
    generation: u64,
    task: TimerTask,
}

struct TimerState {
    entries: Slab<TimerEntry>,
    next_generation: u64,
}

/// Cancellable one-shot timers
///
/// Cloning shares the same queue.
#[derive(Clone)]
pub struct TimerQueue {
    state: Arc<Mutex<TimerState>>,
    clock: Arc<dyn Clock>,
}

impl TimerQueue {
    /// Create a queue on the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create a queue on a custom clock
    pub fn with_clock<C>(clock: C) -> Self
    where
        C: Clock + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(TimerState {
                entries: Slab::new(),
                next_generation: 0,
            })),
            clock: Arc::new(clock),
        }
    }

    /// The clock this queue reads
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Run `task` once, `delay` from now
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = self.clock.now() + delay;
        let id = {
            let mut state = self.state.lock();
            let generation = state.next_generation;
            state.next_generation += 1;
            let key = state.entries.insert(TimerEntry {
                deadline,
                generation,
                task: Box::new(task),
            });
            TimerId { key, generation }
        };

        tracing::trace!(?id, ?delay, "timer armed");

        // The frame loop may be sleeping until an older deadline
        crate::frame_loop::notify_frame_loop();
        id
    }

    /// Cancel a timer that has not fired yet
    ///
    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.state.lock();
        let matches = state
            .entries
            .get(id.key)
            .is_some_and(|entry| entry.generation == id.generation);
        if matches {
            state.entries.remove(id.key);
            tracing::trace!(?id, "timer cancelled");
        }
        matches
    }

    /// Whether the timer is still waiting to fire
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.state
            .lock()
            .entries
            .get(id.key)
            .is_some_and(|entry| entry.generation == id.generation)
    }

    /// Fire every timer whose deadline has passed, earliest first
    ///
    /// Tasks run after the queue lock is released, so they may schedule or
    /// cancel timers. Returns the number of tasks run.
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();

        let mut due: Vec<(Instant, u64, TimerTask)> = {
            let mut state = self.state.lock();
            let keys: Vec<usize> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.deadline <= now)
                .map(|(key, _)| key)
                .collect();
            keys.into_iter()
                .map(|key| {
                    let entry = state.entries.remove(key);
                    (entry.deadline, entry.generation, entry.task)
                })
                .collect()
        };
        due.sort_by_key(|(deadline, generation, _)| (*deadline, *generation));

        let count = due.len();
        for (_, generation, task) in due {
            tracing::trace!(generation, "timer fired");
            task();
        }
        count
    }

    /// Deadline of the earliest armed timer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|(_, entry)| entry.deadline)
            .min()
    }

    /// Number of armed timers
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether no timer is armed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("armed", &self.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, move || {
            count_clone.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[test]
    fn timer_fires_at_deadline_not_before() {
        let clock = ManualClock::new();
        let timers = TimerQueue::with_clock(clock.clone());
        let (fired, task) = counter();

        timers.schedule(Duration::from_millis(1000), task);

        clock.advance(Duration::from_millis(999));
        assert_eq!(timers.run_due(), 0);
        assert_eq!(fired.load(Ordering::Relaxed), 0);

        clock.advance(Duration::from_millis(1));
        assert_eq!(timers.run_due(), 1);
        assert_eq!(fired.load(Ordering::Relaxed), 1);

        // One-shot
        clock.advance(Duration::from_secs(10));
        assert_eq!(timers.run_due(), 0);
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let clock = ManualClock::new();
        let timers = TimerQueue::with_clock(clock.clone());
        let (fired, task) = counter();

        let id = timers.schedule(Duration::from_millis(10), task);
        assert!(timers.is_armed(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));

        clock.advance(Duration::from_millis(20));
        assert_eq!(timers.run_due(), 0);
        assert_eq!(fired.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn stale_id_does_not_cancel_reused_slot() {
        let clock = ManualClock::new();
        let timers = TimerQueue::with_clock(clock.clone());

        let (_, first_task) = counter();
        let first = timers.schedule(Duration::from_millis(1), first_task);
        clock.advance(Duration::from_millis(1));
        assert_eq!(timers.run_due(), 1);

        // The freed slot is reused by the next timer
        let (second_fired, second_task) = counter();
        let second = timers.schedule(Duration::from_millis(5), second_task);

        assert!(!timers.cancel(first));
        assert!(timers.is_armed(second));

        clock.advance(Duration::from_millis(5));
        assert_eq!(timers.run_due(), 1);
        assert_eq!(second_fired.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn due_timers_fire_in_deadline_order() {
        let clock = ManualClock::new();
        let timers = TimerQueue::with_clock(clock.clone());
        let order = Arc::new(Mutex::new(Vec::new()));

        for (label, delay) in [("late", 30), ("early", 10), ("middle", 20)] {
            let order = order.clone();
            timers.schedule(Duration::from_millis(delay), move || order.lock().push(label));
        }
        assert_eq!(
            timers.next_deadline(),
            Some(clock.now() + Duration::from_millis(10))
        );

        clock.advance(Duration::from_millis(30));
        assert_eq!(timers.run_due(), 3);
        assert_eq!(*order.lock(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn task_may_schedule_another_timer() {
        let clock = ManualClock::new();
        let timers = TimerQueue::with_clock(clock.clone());
        let (fired, task) = counter();

        let rearm = timers.clone();
        timers.schedule(Duration::from_millis(1), move || {
            rearm.schedule(Duration::from_millis(1), task);
        });

        clock.advance(Duration::from_millis(1));
        assert_eq!(timers.run_due(), 1);
        assert_eq!(timers.len(), 1);

        clock.advance(Duration::from_millis(1));
        assert_eq!(timers.run_due(), 1);
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }
}
