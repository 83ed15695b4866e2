use super::severity::Severity;
use super::state::{ToastDuration, ToastPosition};
use std::fmt;
use std::time::Duration;

/// One-shot callback attached to a UI request
pub type Callback = Box<dyn FnOnce() + Send>;

fn describe(callback: &Option<Callback>) -> &'static str {
    if callback.is_some() { "Some(..)" } else { "None" }
}

/// Options for [`UiStore::request_alert`](crate::UiStore::request_alert)
#[derive(Default)]
pub struct AlertOptions {
    pub(crate) title: Option<String>,
    pub(crate) severity: Option<Severity>,
    pub(crate) on_acknowledge: Option<Callback>,
    pub(crate) on_dismiss_focus: Option<Callback>,
}

impl AlertOptions {
    /// Defaults: configured "Notice" title, `Info` severity, no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Dialog title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Styling category
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Styling category by name; `"error"` becomes `Danger`, unknown names `Info`
    pub fn severity_name(self, name: &str) -> Self {
        self.severity(Severity::coerce(name))
    }

    /// Runs when the alert is acknowledged
    pub fn on_acknowledge(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_acknowledge = Some(Box::new(f));
        self
    }

    /// Runs after the frame that hides the alert, to restore focus
    pub fn on_dismiss_focus(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_dismiss_focus = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for AlertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertOptions")
            .field("title", &self.title)
            .field("severity", &self.severity)
            .field("on_acknowledge", &describe(&self.on_acknowledge))
            .field("on_dismiss_focus", &describe(&self.on_dismiss_focus))
            .finish()
    }
}

/// Options for [`UiStore::request_confirm`](crate::UiStore::request_confirm)
#[derive(Default)]
pub struct ConfirmOptions {
    pub(crate) title: Option<String>,
    pub(crate) severity: Option<Severity>,
    pub(crate) confirm_label: Option<String>,
    pub(crate) cancel_label: Option<String>,
    pub(crate) on_confirm: Option<Callback>,
    pub(crate) on_cancel: Option<Callback>,
    pub(crate) on_dismiss_focus: Option<Callback>,
}

impl ConfirmOptions {
    /// Defaults: configured title and labels, `Info` severity, no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Dialog title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Styling category
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Styling category by name; `"error"` becomes `Danger`, unknown names `Info`
    pub fn severity_name(self, name: &str) -> Self {
        self.severity(Severity::coerce(name))
    }

    /// Label of the confirming action
    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }

    /// Label of the cancelling action
    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = Some(label.into());
        self
    }

    /// Runs when the user confirms
    pub fn on_confirm(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_confirm = Some(Box::new(f));
        self
    }

    /// Runs when the user cancels
    pub fn on_cancel(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    /// Runs after the frame that hides the dialog, to restore focus
    pub fn on_dismiss_focus(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_dismiss_focus = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for ConfirmOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmOptions")
            .field("title", &self.title)
            .field("severity", &self.severity)
            .field("confirm_label", &self.confirm_label)
            .field("cancel_label", &self.cancel_label)
            .field("on_confirm", &describe(&self.on_confirm))
            .field("on_cancel", &describe(&self.on_cancel))
            .field("on_dismiss_focus", &describe(&self.on_dismiss_focus))
            .finish()
    }
}

/// Options for [`UiStore::request_toast`](crate::UiStore::request_toast)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToastOptions {
    pub(crate) severity: Option<Severity>,
    pub(crate) position: Option<ToastPosition>,
    pub(crate) duration: Option<ToastDuration>,
}

impl ToastOptions {
    /// Defaults: `Info` severity, configured position and duration
    pub fn new() -> Self {
        Self::default()
    }

    /// Styling category
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Styling category by name; `"error"` becomes `Danger`, unknown names `Info`
    pub fn severity_name(self, name: &str) -> Self {
        self.severity(Severity::coerce(name))
    }

    /// Screen position
    pub fn position(mut self, position: ToastPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Auto-dismiss after `duration`
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(ToastDuration::After(duration));
        self
    }

    /// Auto-dismiss after `millis` milliseconds
    pub fn duration_ms(self, millis: u64) -> Self {
        self.duration(Duration::from_millis(millis))
    }

    /// Never auto-dismiss
    pub fn sticky(mut self) -> Self {
        self.duration = Some(ToastDuration::Sticky);
        self
    }
}
