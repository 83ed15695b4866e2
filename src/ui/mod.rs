//! Global UI coordination store
//!
//! One [`UiStore`] holds a loading counter and three dialog-like slots: an
//! alert, a confirm and a toast. Application code fires requests at it; a
//! single mounted [`OverlayRenderer`] draws the resulting
//! [`UiRequestState`] and routes button presses back through
//! [`OverlayActions`].

mod confirm;
mod options;
mod overlay;
mod severity;
mod state;
mod store;

pub use confirm::ConfirmFuture;
pub use options::{AlertOptions, Callback, ConfirmOptions, ToastOptions};
pub use overlay::{OverlayActions, OverlayMount, OverlayRenderer};
pub use severity::Severity;
pub use state::{
    AlertState, ConfirmPhase, ConfirmState, LoadingState, ToastDuration, ToastPosition,
    ToastState, UiRequestState,
};
pub use store::{UiStore, WeakUiStore};
