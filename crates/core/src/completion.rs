//! Completion detection for run status snapshots.

use crate::models::RunResponse;

/// Whether a run has reached a terminal state.
///
/// ParseHub exposes three signals and they are not guaranteed to be
/// populated together, depending on which endpoint produced the snapshot:
///
/// - an explicit terminal `status` (`complete`, `cancelled`, `error`),
/// - a non-blank `end_time`,
/// - an asserted `data_ready` flag.
///
/// Any one of them is sufficient. Missing fields count as "not signalled".
pub fn is_complete(run: &RunResponse) -> bool {
    run.status.as_ref().is_some_and(|s| s.is_terminal())
        || run
            .end_time
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
        || run.data_ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_status::RunStatus;

    fn with_status(status: &str) -> RunResponse {
        RunResponse {
            status: Some(RunStatus::from(status)),
            ..Default::default()
        }
    }

    #[test]
    fn terminal_status_alone_is_complete() {
        assert!(is_complete(&with_status("complete")));
        assert!(is_complete(&with_status("cancelled")));
        assert!(is_complete(&with_status("error")));
    }

    #[test]
    fn end_time_alone_is_complete() {
        let run = RunResponse {
            status: Some(RunStatus::Running),
            end_time: Some("2024-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        assert!(is_complete(&run));
    }

    #[test]
    fn data_ready_alone_is_complete() {
        let run = RunResponse {
            data_ready: true,
            ..Default::default()
        };
        assert!(is_complete(&run));
    }

    #[test]
    fn running_without_signals_is_incomplete() {
        assert!(!is_complete(&with_status("initialized")));
        assert!(!is_complete(&with_status("queued")));
        assert!(!is_complete(&with_status("running")));
    }

    #[test]
    fn blank_end_time_is_not_a_signal() {
        let run = RunResponse {
            end_time: Some("  ".into()),
            ..Default::default()
        };
        assert!(!is_complete(&run));
    }

    #[test]
    fn empty_snapshot_is_incomplete() {
        assert!(!is_complete(&RunResponse::default()));
    }
}
