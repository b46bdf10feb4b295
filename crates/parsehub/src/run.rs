//! The tracker's record of a single ParseHub run.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use hubwatch_core::types::RunToken;
use hubwatch_core::{is_complete, RunResponse};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::handler::RunHandler;

/// Where a run is in its watch lifecycle.
///
/// `Idle -> Watching -> {Completed, Abandoned}`. Unwatching returns a run
/// to `Idle`; an `Abandoned` run may be watched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching,
    /// The run finished and its handler was dispatched.
    Completed,
    /// A status fetch failed and polling stopped.
    Abandoned,
}

/// A ParseHub run known to this process.
///
/// The status snapshot is replaced as a whole on every update, so readers
/// see either the previous or the new snapshot, never a mix.
pub struct Run {
    token: RunToken,
    status: watch::Sender<Option<Arc<RunResponse>>>,
    state: watch::Sender<WatchState>,
    handler: OnceLock<Arc<dyn RunHandler>>,
    /// Cancels the active watch, present only while `Watching`.
    cancel: Mutex<Option<CancellationToken>>,
}

impl Run {
    pub fn new(token: impl Into<RunToken>) -> Self {
        Self {
            token: token.into(),
            status: watch::channel(None).0,
            state: watch::channel(WatchState::Idle).0,
            handler: OnceLock::new(),
            cancel: Mutex::new(None),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Latest status snapshot, if one has been fetched.
    pub fn status(&self) -> Option<Arc<RunResponse>> {
        self.status.borrow().clone()
    }

    /// Whether the latest snapshot is terminal.
    pub fn is_complete(&self) -> bool {
        self.status.borrow().as_deref().is_some_and(is_complete)
    }

    /// Replace the status snapshot.
    ///
    /// A non-terminal snapshot never replaces a terminal one. Returns
    /// whether the snapshot was applied.
    pub fn update_status(&self, snapshot: RunResponse) -> bool {
        let incoming_complete = is_complete(&snapshot);
        let snapshot = Arc::new(snapshot);
        self.status.send_if_modified(|current| {
            let current_complete = current.as_deref().is_some_and(is_complete);
            if current_complete && !incoming_complete {
                return false;
            }
            *current = Some(snapshot);
            true
        })
    }

    /// Set the completion handler. Only the first handler sticks.
    pub fn set_handler(&self, handler: Arc<dyn RunHandler>) -> bool {
        self.handler.set(handler).is_ok()
    }

    pub fn handler(&self) -> Option<Arc<dyn RunHandler>> {
        self.handler.get().cloned()
    }

    pub fn watch_state(&self) -> WatchState {
        *self.state.borrow()
    }

    pub fn is_watching(&self) -> bool {
        self.watch_state() == WatchState::Watching
    }

    /// Receiver that observes every watch-state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<WatchState> {
        self.state.subscribe()
    }

    /// Wait until the run is not being watched and return the state it
    /// settled in. Returns immediately if no watch is active.
    pub async fn wait_until_settled(&self) -> WatchState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|s| *s != WatchState::Watching).await {
            Ok(state) => *state,
            Err(_) => self.watch_state(),
        };
        settled
    }

    // ---- watch bookkeeping, driven by the tracker ----

    /// Move to `Watching` unless a watch is already active or the run has
    /// completed. The check and the transition happen under the state
    /// channel's lock, so two concurrent callers cannot both succeed.
    pub(crate) fn try_begin_watch(&self, cancel: &CancellationToken) -> Result<(), WatchState> {
        let mut refused = None;
        self.state.send_if_modified(|state| match *state {
            WatchState::Watching | WatchState::Completed => {
                refused = Some(*state);
                false
            }
            WatchState::Idle | WatchState::Abandoned => {
                *self.lock_cancel() = Some(cancel.clone());
                *state = WatchState::Watching;
                true
            }
        });
        refused.map_or(Ok(()), Err)
    }

    pub(crate) fn finish_watch(&self, outcome: WatchState) {
        self.lock_cancel().take();
        self.state.send_replace(outcome);
    }

    /// Raise the active watch's cancellation signal. Returns whether a
    /// watch was active.
    pub(crate) fn cancel_watch(&self) -> bool {
        match self.lock_cancel().take() {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        // The guarded value is a plain Option, so a poisoned lock is still
        // consistent.
        self.cancel.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("token", &self.token)
            .field("status", &self.status())
            .field("state", &self.watch_state())
            .field("has_handler", &self.handler.get().is_some())
            .finish()
    }
}
