use crate::error::UnknownSeverity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category driving overlay styling
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information
    #[default]
    Info,
    /// Completed successfully
    Success,
    /// Needs attention
    Warning,
    /// Failed or destructive; `"error"` normalizes to this
    #[serde(alias = "error")]
    Danger,
}

/// Accepted severity names, aliases included
const SEVERITY_NAMES: &[(&str, Severity)] = &[
    ("info", Severity::Info),
    ("success", Severity::Success),
    ("warning", Severity::Warning),
    ("danger", Severity::Danger),
    ("error", Severity::Danger),
];

impl Severity {
    /// Look up a severity by name (case-insensitive, aliases included)
    pub fn normalize(name: &str) -> Option<Severity> {
        SEVERITY_NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
            .map(|(_, severity)| *severity)
    }

    /// Like [`normalize`](Self::normalize), falling back to `Info`
    pub fn coerce(name: &str) -> Severity {
        Self::normalize(name).unwrap_or_else(|| {
            tracing::debug!(name, "unknown severity; using info");
            Severity::Info
        })
    }

    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| UnknownSeverity { name: s.to_owned() })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
