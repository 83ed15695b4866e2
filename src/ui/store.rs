use super::confirm::{ConfirmFuture, ConfirmSender};
use super::options::{AlertOptions, Callback, ConfirmOptions, ToastOptions};
use super::state::{ConfirmPhase, ToastDuration, UiRequestState};
use crate::config::UiConfig;
use crate::error::ConfirmError;
use crate::scheduler::after_frame;
use crate::store::{Store, Subscription};
use crate::timer::{TimerId, TimerQueue};
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, LazyLock, Weak};
use tracing::{debug, trace, warn};

static GLOBAL: LazyLock<UiStore> = LazyLock::new(|| UiStore::new(UiConfig::default()));

struct PendingConfirm {
    sender: ConfirmSender,
    on_confirm: Option<Callback>,
    on_cancel: Option<Callback>,
    on_dismiss_focus: Option<Callback>,
}

/// Everything that cannot live in the plain-data snapshot
#[derive(Default)]
struct Hooks {
    on_acknowledge: Option<Callback>,
    alert_dismiss_focus: Option<Callback>,
    confirm: Option<PendingConfirm>,
    confirm_phase: ConfirmPhase,
    // Bumped on every request_confirm; a resolution only hides the dialog it answered
    confirm_seq: u64,
    toast_timer: Option<TimerId>,
    // Bumped on every toast show or dismiss; stale timer tasks compare against it
    toast_seq: u64,
}

pub(crate) struct UiStoreInner {
    state: Store<UiRequestState>,
    hooks: Mutex<Hooks>,
    timers: TimerQueue,
    config: UiConfig,
    pub(crate) overlay_mounted: AtomicBool,
}

/// Process-wide coordinator for loading, alert, confirm and toast requests
///
/// Request functions are fire-and-forget: they update the
/// [`UiRequestState`] snapshot and the overlay renders it on the next frame.
/// None of them fail or panic. Cloning yields another handle to the same
/// store.
///
/// Toast auto-dismissal is driven by [`timers`](Self::timers); hand the queue
/// to a [`FrameLoop`](crate::FrameLoop) or call
/// [`TimerQueue::run_due`] from the host loop.
///
/// # Example
///
/// ```ignore
/// let ui = UiStore::global();
/// ui.push_loading();
/// let answer = ui.request_confirm("Delete file?", ConfirmOptions::new().severity(Severity::Danger));
/// // ... the overlay calls ui.resolve_confirm(true) ...
/// if answer.await == Ok(true) {
///     ui.request_toast("Deleted", ToastOptions::new().severity(Severity::Success));
/// }
/// ui.pop_loading();
/// ```
#[derive(Clone)]
pub struct UiStore {
    pub(crate) inner: Arc<UiStoreInner>,
}

/// Non-owning handle to a [`UiStore`]
#[derive(Clone)]
pub struct WeakUiStore {
    inner: Weak<UiStoreInner>,
}

impl WeakUiStore {
    /// The store, if it is still alive
    pub fn upgrade(&self) -> Option<UiStore> {
        self.inner.upgrade().map(|inner| UiStore { inner })
    }
}

impl std::fmt::Debug for WeakUiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakUiStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl UiStore {
    /// Create a store whose toast timers run on the system clock
    pub fn new(config: UiConfig) -> Self {
        Self::with_timers(config, TimerQueue::new())
    }

    /// Create a store scheduling toast timers on `timers`
    pub fn with_timers(config: UiConfig, timers: TimerQueue) -> Self {
        Self {
            inner: Arc::new(UiStoreInner {
                state: Store::new(UiRequestState::default()),
                hooks: Mutex::new(Hooks::default()),
                timers,
                config,
                overlay_mounted: AtomicBool::new(false),
            }),
        }
    }

    /// The process-wide store, created with the default config on first use
    pub fn global() -> &'static UiStore {
        &GLOBAL
    }

    /// Non-owning handle, for timer tasks and overlay actions
    pub fn downgrade(&self) -> WeakUiStore {
        WeakUiStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Snapshot of all request slots
    pub fn state(&self) -> UiRequestState {
        self.inner.state.snapshot()
    }

    /// The underlying observable store
    pub fn store(&self) -> &Store<UiRequestState> {
        &self.inner.state
    }

    /// Call `callback` with the snapshot on every frame following a change
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&UiRequestState) + Send + 'static,
    {
        self.inner.state.subscribe(callback)
    }

    /// Call `callback` whenever the selected part of the snapshot changes
    pub fn select<T, Sel, F>(&self, selector: Sel, callback: F) -> Subscription
    where
        T: PartialEq + Send + 'static,
        Sel: Fn(&UiRequestState) -> T + Send + 'static,
        F: FnMut(&T) + Send + 'static,
    {
        self.inner.state.select(selector, callback)
    }

    /// Queue driving toast auto-dismissal
    pub fn timers(&self) -> &TimerQueue {
        &self.inner.timers
    }

    /// Defaults in effect
    pub fn config(&self) -> &UiConfig {
        &self.inner.config
    }

    /// Where the confirm slot is in its lifecycle
    pub fn confirm_phase(&self) -> ConfirmPhase {
        self.inner.hooks.lock().confirm_phase
    }

    /// Outstanding loading requests
    pub fn loading_count(&self) -> usize {
        self.inner.state.read(|state| state.loading.count)
    }

    /// Add a loading request; returns the new count
    pub fn push_loading(&self) -> usize {
        let count = self.inner.state.update(|state| {
            state.loading.count += 1;
            state.loading.visible = true;
            state.loading.count
        });
        debug!(count, "loading pushed");
        count
    }

    /// Remove a loading request; returns the new count
    ///
    /// The count never goes below zero. Popping at zero changes nothing.
    pub fn pop_loading(&self) -> usize {
        if self.loading_count() == 0 {
            debug!("pop_loading at zero ignored");
            return 0;
        }
        let count = self.inner.state.update(|state| {
            state.loading.count = state.loading.count.saturating_sub(1);
            state.loading.visible = state.loading.count > 0;
            state.loading.count
        });
        debug!(count, "loading popped");
        count
    }

    /// Force the loading indicator on or off
    ///
    /// Resets the count to 1 or 0, discarding outstanding pushes; mixing this
    /// with [`push_loading`](Self::push_loading) in overlapping flows hides the
    /// indicator early.
    pub fn set_loading(&self, visible: bool) {
        self.inner.state.update(|state| {
            state.loading.count = usize::from(visible);
            state.loading.visible = visible;
        });
        debug!(visible, "loading forced");
    }

    /// Show an alert, replacing any alert already shown
    pub fn request_alert(&self, message: impl Into<String>, options: AlertOptions) {
        let AlertOptions {
            title,
            severity,
            on_acknowledge,
            on_dismiss_focus,
        } = options;
        let replaced = {
            let mut hooks = self.inner.hooks.lock();
            let replaced = hooks.on_acknowledge.is_some();
            hooks.on_acknowledge = on_acknowledge;
            hooks.alert_dismiss_focus = on_dismiss_focus;
            replaced
        };

        let message = message.into();
        let title = title.unwrap_or_else(|| self.inner.config.labels.notice_title.clone());
        let severity = severity.unwrap_or_default();
        debug!(%severity, replaced, "alert requested");
        self.inner.state.update(|state| {
            state.alert.visible = true;
            state.alert.title = title;
            state.alert.message = message;
            state.alert.severity = severity;
        });
    }

    /// Hide the alert and run its callbacks
    ///
    /// `on_acknowledge` runs immediately; `on_dismiss_focus` runs after the
    /// frame that hides the dialog. Does nothing when no alert is shown.
    pub fn acknowledge_alert(&self) {
        if !self.inner.state.read(|state| state.alert.visible) {
            debug!("acknowledge_alert without a visible alert ignored");
            return;
        }
        let (on_acknowledge, on_dismiss_focus) = {
            let mut hooks = self.inner.hooks.lock();
            (hooks.on_acknowledge.take(), hooks.alert_dismiss_focus.take())
        };

        self.inner.state.update(|state| state.alert.visible = false);
        debug!("alert acknowledged");

        if let Some(callback) = on_acknowledge {
            callback();
        }
        if let Some(callback) = on_dismiss_focus {
            after_frame(callback);
        }
    }

    /// Ask the user a yes/no question
    ///
    /// The returned future resolves once [`resolve_confirm`](Self::resolve_confirm)
    /// is called. A confirm still pending is superseded: its future resolves to
    /// `Err(ConfirmError::Superseded)` and its callbacks are dropped unrun.
    pub fn request_confirm(
        &self,
        message: impl Into<String>,
        options: ConfirmOptions,
    ) -> ConfirmFuture {
        let ConfirmOptions {
            title,
            severity,
            confirm_label,
            cancel_label,
            on_confirm,
            on_cancel,
            on_dismiss_focus,
        } = options;
        let (sender, future) = ConfirmFuture::channel();

        let superseded = {
            let mut hooks = self.inner.hooks.lock();
            hooks.confirm_seq += 1;
            hooks.confirm_phase = ConfirmPhase::Pending;
            hooks.confirm.replace(PendingConfirm {
                sender,
                on_confirm,
                on_cancel,
                on_dismiss_focus,
            })
        };
        if let Some(previous) = superseded {
            warn!("confirm superseded by a newer request");
            // The earlier caller may have dropped its future already
            let _ = previous.sender.send(Err(ConfirmError::Superseded));
        }

        let labels = &self.inner.config.labels;
        let message = message.into();
        let title = title.unwrap_or_else(|| labels.confirm_title.clone());
        let confirm_label = confirm_label.unwrap_or_else(|| labels.confirm_label.clone());
        let cancel_label = cancel_label.unwrap_or_else(|| labels.cancel_label.clone());
        let severity = severity.unwrap_or_default();
        debug!(%severity, "confirm requested");
        self.inner.state.update(|state| {
            let confirm = &mut state.confirm;
            confirm.visible = true;
            confirm.title = title;
            confirm.message = message;
            confirm.severity = severity;
            confirm.confirm_label = confirm_label;
            confirm.cancel_label = cancel_label;
        });

        future
    }

    /// Answer the pending confirm
    ///
    /// Runs `on_confirm` or `on_cancel`, settles the future with `Ok(answer)`,
    /// hides the dialog, and queues `on_dismiss_focus` after the hide frame.
    /// A new confirm requested from inside a callback stays visible. Does
    /// nothing when no confirm is pending.
    pub fn resolve_confirm(&self, answer: bool) {
        let (pending, seq) = {
            let mut hooks = self.inner.hooks.lock();
            let Some(pending) = hooks.confirm.take() else {
                debug!(answer, "resolve_confirm without a pending confirm ignored");
                return;
            };
            hooks.confirm_phase = ConfirmPhase::Resolving;
            (pending, hooks.confirm_seq)
        };
        let PendingConfirm {
            sender,
            on_confirm,
            on_cancel,
            on_dismiss_focus,
        } = pending;
        debug!(answer, "confirm resolved");

        let callback = if answer { on_confirm } else { on_cancel };
        if let Some(callback) = callback {
            callback();
        }
        // The caller may have dropped the future
        let _ = sender.send(Ok(answer));

        let still_current = {
            let mut hooks = self.inner.hooks.lock();
            let current = hooks.confirm_seq == seq;
            if current {
                hooks.confirm_phase = ConfirmPhase::Idle;
            }
            current
        };
        if still_current {
            self.inner.state.update(|state| state.confirm.visible = false);
        }

        if let Some(callback) = on_dismiss_focus {
            after_frame(callback);
        }
    }

    /// Show a toast, replacing the current one and restarting its timer
    pub fn request_toast(&self, message: impl Into<String>, options: ToastOptions) {
        let toast_config = &self.inner.config.toast;
        let duration = options.duration.unwrap_or_else(|| toast_config.duration());
        let position = options.position.unwrap_or(toast_config.position);
        let severity = options.severity.unwrap_or_default();

        {
            let mut hooks = self.inner.hooks.lock();
            if let Some(timer) = hooks.toast_timer.take() {
                self.inner.timers.cancel(timer);
            }
            hooks.toast_seq += 1;
            if let ToastDuration::After(delay) = duration {
                let seq = hooks.toast_seq;
                let store = self.downgrade();
                let timer = self.inner.timers.schedule(delay, move || {
                    if let Some(store) = store.upgrade() {
                        store.expire_toast(seq);
                    }
                });
                hooks.toast_timer = Some(timer);
            }
        }

        let message = message.into();
        debug!(%severity, ?position, ?duration, "toast requested");
        self.inner.state.update(|state| {
            let toast = &mut state.toast;
            toast.visible = true;
            toast.message = message;
            toast.severity = severity;
            toast.position = position;
            toast.duration_ms = duration.as_millis();
        });
    }

    /// Hide the toast and cancel its timer
    pub fn dismiss_toast(&self) {
        {
            let mut hooks = self.inner.hooks.lock();
            if let Some(timer) = hooks.toast_timer.take() {
                self.inner.timers.cancel(timer);
            }
            hooks.toast_seq += 1;
        }
        if !self.inner.state.read(|state| state.toast.visible) {
            debug!("dismiss_toast without a visible toast ignored");
            return;
        }
        debug!("toast dismissed");
        self.inner.state.update(|state| state.toast.visible = false);
    }

    fn expire_toast(&self, seq: u64) {
        {
            let mut hooks = self.inner.hooks.lock();
            if hooks.toast_seq != seq {
                return;
            }
            hooks.toast_timer = None;
        }
        trace!("toast expired");
        self.inner.state.update(|state| state.toast.visible = false);
    }
}

impl std::fmt::Debug for UiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiStore")
            .field("state", &self.state())
            .field("confirm_phase", &self.confirm_phase())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::flush_frame;
    use crate::timer::ManualClock;
    use crate::ui::{Severity, ToastPosition};
    use futures::executor::block_on;
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn manual_store() -> (UiStore, ManualClock) {
        let clock = ManualClock::new();
        let store = UiStore::with_timers(UiConfig::default(), TimerQueue::with_clock(clock.clone()));
        (store, clock)
    }

    #[test]
    fn set_loading_overrides_the_count() {
        let ui = UiStore::new(UiConfig::default());
        ui.push_loading();
        ui.push_loading();
        ui.set_loading(false);
        assert_eq!(ui.loading_count(), 0);
        assert!(!ui.state().loading.visible);

        ui.set_loading(true);
        assert_eq!(ui.loading_count(), 1);
        assert_eq!(ui.pop_loading(), 0);
        assert!(!ui.state().loading.visible);
    }

    #[test]
    fn alert_uses_configured_title_and_default_severity() {
        let ui = UiStore::new(UiConfig::default());
        ui.request_alert("Saved", AlertOptions::new());
        let alert = ui.state().alert;
        assert!(alert.visible);
        assert_eq!(alert.title, "Notice");
        assert_eq!(alert.message, "Saved");
        assert_eq!(alert.severity, Severity::Info);
    }

    #[test]
    #[serial]
    fn acknowledge_runs_callback_now_and_focus_after_the_frame() {
        let ui = UiStore::new(UiConfig::default());
        let acknowledged = Arc::new(AtomicUsize::new(0));
        let focused = Arc::new(AtomicUsize::new(0));

        let ack = Arc::clone(&acknowledged);
        let focus = Arc::clone(&focused);
        ui.request_alert(
            "Disk almost full",
            AlertOptions::new()
                .severity(Severity::Warning)
                .on_acknowledge(move || {
                    ack.fetch_add(1, Ordering::SeqCst);
                })
                .on_dismiss_focus(move || {
                    focus.fetch_add(1, Ordering::SeqCst);
                }),
        );

        ui.acknowledge_alert();
        assert!(!ui.state().alert.visible);
        assert_eq!(acknowledged.load(Ordering::SeqCst), 1);
        assert_eq!(focused.load(Ordering::SeqCst), 0);

        flush_frame();
        assert_eq!(focused.load(Ordering::SeqCst), 1);

        // Nothing left to run on a second acknowledgement
        ui.acknowledge_alert();
        flush_frame();
        assert_eq!(acknowledged.load(Ordering::SeqCst), 1);
        assert_eq!(focused.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn confirm_fills_labels_from_config() {
        let mut config = UiConfig::default();
        config.labels.cancel_label = "Keep".to_owned();
        let ui = UiStore::new(config);

        let _answer = ui.request_confirm("Discard draft?", ConfirmOptions::new().confirm_label("Discard"));
        let confirm = ui.state().confirm;
        assert!(confirm.visible);
        assert_eq!(confirm.title, "Confirm");
        assert_eq!(confirm.confirm_label, "Discard");
        assert_eq!(confirm.cancel_label, "Keep");
        assert_eq!(ui.confirm_phase(), ConfirmPhase::Pending);
    }

    #[test]
    fn resolve_runs_only_the_matching_callback() {
        let ui = UiStore::new(UiConfig::default());
        let confirmed = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&confirmed);
        let x = Arc::clone(&cancelled);
        let answer = ui.request_confirm(
            "Leave page?",
            ConfirmOptions::new()
                .on_confirm(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .on_cancel(move || {
                    x.fetch_add(1, Ordering::SeqCst);
                }),
        );
        ui.resolve_confirm(false);

        assert_eq!(block_on(answer), Ok(false));
        assert_eq!(confirmed.load(Ordering::SeqCst), 0);
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        assert!(!ui.state().confirm.visible);
        assert_eq!(ui.confirm_phase(), ConfirmPhase::Idle);
    }

    #[test]
    fn resolve_without_pending_confirm_is_a_no_op() {
        let ui = UiStore::new(UiConfig::default());
        ui.resolve_confirm(true);
        assert_eq!(ui.confirm_phase(), ConfirmPhase::Idle);
        assert!(!ui.state().confirm.visible);
    }

    #[test]
    fn confirm_requested_from_a_callback_stays_visible() {
        let ui = UiStore::new(UiConfig::default());
        let follow_up = Arc::new(Mutex::new(None));

        let chained = ui.clone();
        let slot = Arc::clone(&follow_up);
        let first = ui.request_confirm(
            "Delete project?",
            ConfirmOptions::new().on_confirm(move || {
                *slot.lock() = Some(chained.request_confirm("Really?", ConfirmOptions::new()));
            }),
        );
        ui.resolve_confirm(true);

        assert_eq!(block_on(first), Ok(true));
        let state = ui.state().confirm;
        assert!(state.visible);
        assert_eq!(state.message, "Really?");
        assert_eq!(ui.confirm_phase(), ConfirmPhase::Pending);

        ui.resolve_confirm(false);
        let second = follow_up.lock().take().unwrap();
        assert_eq!(block_on(second), Ok(false));
    }

    #[test]
    fn dropping_the_store_abandons_the_confirm() {
        let ui = UiStore::new(UiConfig::default());
        let answer = ui.request_confirm("Quit?", ConfirmOptions::new());
        drop(ui);
        assert_eq!(block_on(answer), Err(ConfirmError::Abandoned));
    }

    #[test]
    fn try_take_reports_pending_then_answer() {
        let ui = UiStore::new(UiConfig::default());
        let mut answer = ui.request_confirm("Overwrite?", ConfirmOptions::new());
        assert_eq!(answer.try_take(), None);
        ui.resolve_confirm(true);
        assert_eq!(answer.try_take(), Some(Ok(true)));
    }

    #[test]
    fn toast_uses_configured_defaults() {
        let (ui, _clock) = manual_store();
        ui.request_toast("Copied", ToastOptions::new());
        let toast = ui.state().toast;
        assert!(toast.visible);
        assert_eq!(toast.position, ToastPosition::Center);
        assert_eq!(toast.duration_ms, Some(2000));
        assert_eq!(ui.timers().len(), 1);
    }

    #[test]
    fn sticky_toast_never_expires() {
        let (ui, clock) = manual_store();
        ui.request_toast("Offline", ToastOptions::new().sticky());
        assert_eq!(ui.state().toast.duration_ms, None);
        assert!(ui.timers().is_empty());

        clock.advance(Duration::from_secs(3600));
        ui.timers().run_due();
        assert!(ui.state().toast.visible);

        ui.dismiss_toast();
        assert!(!ui.state().toast.visible);
    }

    #[test]
    fn dismiss_cancels_the_timer() {
        let (ui, clock) = manual_store();
        ui.request_toast("Sent", ToastOptions::new().duration_ms(1000));
        ui.dismiss_toast();
        assert!(ui.timers().is_empty());

        ui.request_toast("Sent again", ToastOptions::new().sticky());
        clock.advance(Duration::from_millis(1500));
        assert_eq!(ui.timers().run_due(), 0);
        assert!(ui.state().toast.visible);
    }

    #[test]
    fn timer_outliving_the_store_does_nothing() {
        let (ui, clock) = manual_store();
        let timers = ui.timers().clone();
        ui.request_toast("Bye", ToastOptions::new().duration_ms(10));
        drop(ui);

        clock.advance(Duration::from_millis(10));
        assert_eq!(timers.run_due(), 1);
    }
}
