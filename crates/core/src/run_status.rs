//! Lifecycle status reported by ParseHub for a run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `status` field of a run.
///
/// ParseHub documents `initialized`, `queued`, `running`, `cancelled`,
/// `complete` and `error`. Anything else is preserved verbatim in
/// [`RunStatus::Other`] so a new server-side value never fails decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Initialized,
    Queued,
    Running,
    Cancelled,
    Complete,
    Error,
    Other(String),
}

impl RunStatus {
    /// Whether no further progress can happen from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Complete | Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Initialized => "initialized",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Cancelled => "cancelled",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "initialized" => Self::Initialized,
            "queued" => Self::Queued,
            "running" => Self::Running,
            // Both spellings show up in the wild.
            "cancelled" | "canceled" => Self::Cancelled,
            "complete" | "completed" | "finished" => Self::Complete,
            "error" | "failed" => Self::Error,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for RunStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
