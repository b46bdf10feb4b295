//! Run lifecycle events emitted by the tracker.
//!
//! Published on a [`tokio::sync::broadcast`] channel. Call
//! [`ParseHub::subscribe`](crate::tracker::ParseHub::subscribe) to receive
//! them. Background watches have no caller to return errors to, so
//! abandonment and handler failures are visible here as well as in the log.

use hubwatch_core::types::RunToken;
use hubwatch_core::RunStatus;
use serde::Serialize;

/// A state change of a tracked run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A poll loop started for the run.
    WatchStarted { run_token: RunToken },

    /// A poll fetched a new status snapshot.
    StatusUpdated {
        run_token: RunToken,
        status: Option<RunStatus>,
        complete: bool,
    },

    /// The handler succeeded and the run left the registry.
    Completed { run_token: RunToken },

    /// The handler reported failure. The run stays in the registry.
    HandlerFailed { run_token: RunToken, error: String },

    /// A status fetch failed and the watch stopped.
    Abandoned { run_token: RunToken, error: String },

    /// The watch was cancelled before the run finished.
    Unwatched { run_token: RunToken },

    /// The run was deleted on ParseHub and dropped from the registry.
    Removed { run_token: RunToken },
}

impl RunEvent {
    pub fn run_token(&self) -> &str {
        match self {
            Self::WatchStarted { run_token }
            | Self::StatusUpdated { run_token, .. }
            | Self::Completed { run_token }
            | Self::HandlerFailed { run_token, .. }
            | Self::Abandoned { run_token, .. }
            | Self::Unwatched { run_token }
            | Self::Removed { run_token } => run_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_token_accessor_covers_variants() {
        let event = RunEvent::HandlerFailed {
            run_token: "r1".into(),
            error: "boom".into(),
        };
        assert_eq!(event.run_token(), "r1");
    }

    #[test]
    fn serializes_with_event_tag() {
        let event = RunEvent::StatusUpdated {
            run_token: "r1".into(),
            status: Some(RunStatus::Running),
            complete: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "status_updated");
        assert_eq!(json["status"], "running");
    }
}
