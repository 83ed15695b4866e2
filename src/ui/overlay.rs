use super::state::UiRequestState;
use super::store::{UiStore, WeakUiStore};
use crate::error::UiError;
use crate::store::Subscription;
use std::sync::atomic::Ordering;

/// Draws the loading, alert, confirm and toast slots
///
/// Implemented for any `FnMut(&UiRequestState, &OverlayActions)` closure.
pub trait OverlayRenderer: Send + 'static {
    /// Draw `state`; user input is routed back through `actions`
    fn render(&mut self, state: &UiRequestState, actions: &OverlayActions);
}

impl<F> OverlayRenderer for F
where
    F: FnMut(&UiRequestState, &OverlayActions) + Send + 'static,
{
    fn render(&mut self, state: &UiRequestState, actions: &OverlayActions) {
        self(state, actions)
    }
}

/// User-input entry points handed to an [`OverlayRenderer`]
///
/// Each action is a no-op once the store is gone.
#[derive(Clone, Debug)]
pub struct OverlayActions {
    store: WeakUiStore,
}

impl OverlayActions {
    /// The alert's acknowledge button
    pub fn acknowledge_alert(&self) {
        if let Some(store) = self.store.upgrade() {
            store.acknowledge_alert();
        }
    }

    /// The confirm dialog's confirming button
    pub fn confirm(&self) {
        if let Some(store) = self.store.upgrade() {
            store.resolve_confirm(true);
        }
    }

    /// The confirm dialog's cancelling button, or dismissing the dialog
    pub fn cancel(&self) {
        if let Some(store) = self.store.upgrade() {
            store.resolve_confirm(false);
        }
    }

    /// The toast's exit transition finished
    pub fn toast_exited(&self) {
        if let Some(store) = self.store.upgrade() {
            store.dismiss_toast();
        }
    }
}

/// A mounted overlay; dropping it unmounts
#[must_use = "dropping an OverlayMount unmounts the overlay"]
pub struct OverlayMount {
    store: WeakUiStore,
    _subscription: Subscription,
}

impl Drop for OverlayMount {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.inner.overlay_mounted.store(false, Ordering::Release);
            tracing::debug!("overlay unmounted");
        }
    }
}

impl std::fmt::Debug for OverlayMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayMount").finish_non_exhaustive()
    }
}

impl UiStore {
    /// Attach the renderer that draws this store
    ///
    /// `renderer` runs right away with the current snapshot, then on every
    /// frame after a change. Only one overlay may be mounted per store.
    pub fn mount_overlay<R>(&self, mut renderer: R) -> Result<OverlayMount, UiError>
    where
        R: OverlayRenderer,
    {
        if self
            .inner
            .overlay_mounted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(UiError::OverlayAlreadyMounted);
        }
        tracing::debug!("overlay mounted");

        let actions = OverlayActions {
            store: self.downgrade(),
        };
        renderer.render(&self.state(), &actions);
        let subscription = self.subscribe(move |state| renderer.render(state, &actions));

        Ok(OverlayMount {
            store: self.downgrade(),
            _subscription: subscription,
        })
    }
}
