use super::severity::Severity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of every UI request slot
///
/// Plain data only: callbacks and the pending confirm resolver live in the
/// [`UiStore`](crate::UiStore) beside it, so the snapshot can be cloned,
/// compared, and serialized freely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiRequestState {
    /// Loading indicator
    pub loading: LoadingState,
    /// Alert dialog
    pub alert: AlertState,
    /// Confirm dialog
    pub confirm: ConfirmState,
    /// Toast
    pub toast: ToastState,
}

/// Reference-counted loading indicator
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingState {
    /// Outstanding loading requests
    pub count: usize,
    /// `count > 0`, unless forced by `set_loading`
    pub visible: bool,
}

/// Alert dialog slot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    /// Whether the dialog is shown
    pub visible: bool,
    /// Dialog title
    pub title: String,
    /// Dialog body
    pub message: String,
    /// Styling category
    pub severity: Severity,
}

/// Confirm dialog slot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmState {
    /// Whether the dialog is shown
    pub visible: bool,
    /// Dialog title
    pub title: String,
    /// Dialog body
    pub message: String,
    /// Styling category
    pub severity: Severity,
    /// Label of the confirming action
    pub confirm_label: String,
    /// Label of the cancelling action
    pub cancel_label: String,
}

/// Toast slot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastState {
    /// Whether the toast is shown
    pub visible: bool,
    /// Toast text
    pub message: String,
    /// Styling category
    pub severity: Severity,
    /// Screen position
    pub position: ToastPosition,
    /// Auto-dismiss delay; `None` when the toast stays until dismissed
    pub duration_ms: Option<u64>,
}

/// Where the toast is drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastPosition {
    /// Top edge
    Top,
    /// Screen center
    #[default]
    Center,
    /// Bottom edge
    Bottom,
}

/// How long a toast stays up on its own
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastDuration {
    /// Auto-dismiss after this long
    After(Duration),
    /// Stay until `dismiss_toast` (the `Infinity` duration)
    Sticky,
}

impl ToastDuration {
    /// Milliseconds, or `None` for sticky toasts
    pub fn as_millis(self) -> Option<u64> {
        match self {
            ToastDuration::After(duration) => {
                Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
            }
            ToastDuration::Sticky => None,
        }
    }

    /// Inverse of [`as_millis`](Self::as_millis)
    pub fn from_millis(millis: Option<u64>) -> Self {
        match millis {
            Some(ms) => ToastDuration::After(Duration::from_millis(ms)),
            None => ToastDuration::Sticky,
        }
    }
}

/// Lifecycle of the single confirm slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConfirmPhase {
    /// No confirm outstanding
    #[default]
    Idle,
    /// Dialog shown, waiting for `resolve_confirm`
    Pending,
    /// Callbacks running and the future settling
    Resolving,
}
