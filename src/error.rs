//! Error types
//!
//! Request functions on the UI store never fail; these errors only surface from
//! the checked constructors, typed reads, configuration parsing, overlay
//! mounting, and the settlement of a confirm that never got an answer.

use thiserror::Error;

/// Errors from the reactive containers
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// `ReactiveObject` was given something other than a JSON object
    #[error("reactive object needs a JSON object, got {found}")]
    NotAnObject {
        /// JSON kind that was supplied
        found: &'static str,
    },

    /// `ReactiveList` was given something other than a JSON array
    #[error("reactive list needs a JSON array, got {found}")]
    NotAList {
        /// JSON kind that was supplied
        found: &'static str,
    },

    /// A typed read could not convert the stored value
    #[error("failed to read value as the requested type: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Why a confirm request settled without an answer
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmError {
    /// A newer `request_confirm` replaced this one before it was resolved
    #[error("confirm request was superseded by a newer request")]
    Superseded,

    /// The store holding the request was dropped
    #[error("confirm request was abandoned before it was resolved")]
    Abandoned,
}

/// Errors from the UI store surface
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UiError {
    /// Only one overlay may render a store at a time
    #[error("an overlay is already mounted on this store")]
    OverlayAlreadyMounted,
}

/// A severity name outside the accepted table
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown severity {name:?}")]
pub struct UnknownSeverity {
    /// The rejected name
    pub name: String,
}

/// Errors loading [`UiConfig`](crate::UiConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid
    #[error("invalid UI configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Name of a JSON value's kind, for error messages
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
