//! UI store configuration

use crate::error::ConfigError;
use crate::ui::{ToastDuration, ToastPosition};
use serde::{Deserialize, Serialize};

/// Defaults applied by [`UiStore`](crate::UiStore) when a request leaves them out
///
/// Every field has a default, so partial JSON is accepted:
///
/// ```ignore
/// let config = UiConfig::from_json(r#"{ "labels": { "cancel_label": "Abbrechen" } }"#)?;
/// assert_eq!(config.labels.confirm_label, "OK");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Dialog titles and button labels
    pub labels: Labels,
    /// Toast defaults
    pub toast: ToastDefaults,
}

impl UiConfig {
    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Dialog titles and button labels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Alert title
    pub notice_title: String,
    /// Confirm title
    pub confirm_title: String,
    /// Confirming button
    pub confirm_label: String,
    /// Cancelling button
    pub cancel_label: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            notice_title: "Notice".to_owned(),
            confirm_title: "Confirm".to_owned(),
            confirm_label: "OK".to_owned(),
            cancel_label: "Cancel".to_owned(),
        }
    }
}

/// Toast defaults
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastDefaults {
    /// Auto-dismiss delay in milliseconds; `null` keeps toasts up until dismissed
    pub duration_ms: Option<u64>,
    /// Screen position
    pub position: ToastPosition,
}

impl ToastDefaults {
    /// Default auto-dismiss delay in milliseconds
    pub const DEFAULT_DURATION_MS: u64 = 2000;

    /// `duration_ms` as a [`ToastDuration`]
    pub fn duration(&self) -> ToastDuration {
        ToastDuration::from_millis(self.duration_ms)
    }
}

impl Default for ToastDefaults {
    fn default() -> Self {
        Self {
            duration_ms: Some(Self::DEFAULT_DURATION_MS),
            position: ToastPosition::Center,
        }
    }
}
