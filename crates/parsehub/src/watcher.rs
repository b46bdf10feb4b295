//! Per-run poll loop.
//!
//! One task per watched run: sleep for the poll interval, fetch the
//! latest status, store it, and stop once the run is terminal. A finished
//! run is handed to [`dispatch`] from inside the same task. A failed fetch
//! ends the watch (after the configured retries, if any) without calling
//! the handler; the last known status stays on the run.

use std::sync::Arc;
use std::time::Duration;

use hubwatch_core::RunResponse;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::Dispatch;

use crate::error::ParseHubError;
use crate::events::RunEvent;
use crate::handler::dispatch;
use crate::registry::RunRegistry;
use crate::remote::RemoteClient;
use crate::retry::{next_delay, RetryPolicy};
use crate::run::{Run, WatchState};

/// Everything a watch task needs, cloned out of the tracker.
#[derive(Clone)]
pub(crate) struct WatchContext {
    pub remote: Arc<dyn RemoteClient>,
    pub registry: Arc<RunRegistry>,
    pub events: broadcast::Sender<RunEvent>,
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    /// Dispatcher of the code that requested the watch. The handler runs
    /// under it.
    pub handler_log: Dispatch,
}

/// Why a status fetch produced no snapshot.
enum FetchAbort {
    Cancelled,
    Failed(ParseHubError),
}

/// Drive one run from `Watching` to its final state and record it.
pub(crate) async fn run_watch(run: Arc<Run>, ctx: WatchContext, cancel: CancellationToken) {
    let outcome = poll_until_settled(&run, &ctx, &cancel).await;
    run.finish_watch(outcome);
    tracing::debug!(run_token = %run.token(), state = ?outcome, "Watch task exited");
}

async fn poll_until_settled(
    run: &Arc<Run>,
    ctx: &WatchContext,
    cancel: &CancellationToken,
) -> WatchState {
    let run_token = run.token().to_string();

    tracing::debug!(
        run_token = %run_token,
        interval_secs = ctx.poll_interval.as_secs_f64(),
        "Start watching run",
    );
    let _ = ctx.events.send(RunEvent::WatchStarted {
        run_token: run_token.clone(),
    });

    // Already terminal (e.g. loaded from a webhook): nothing to poll.
    while !run.is_complete() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return unwatched(ctx, run_token),
            _ = tokio::time::sleep(ctx.poll_interval) => {}
        }

        // A cancel or refresh during the sleep may have finished the run.
        if run.is_complete() {
            break;
        }

        tracing::debug!(run_token = %run_token, "Watch iteration");

        let snapshot = match fetch_status(run, ctx, cancel).await {
            Ok(snapshot) => snapshot,
            Err(FetchAbort::Cancelled) => return unwatched(ctx, run_token),
            Err(FetchAbort::Failed(e)) => {
                tracing::error!(
                    run_token = %run_token,
                    error = %e,
                    "Status fetch failed, abandoning watch",
                );
                let _ = ctx.events.send(RunEvent::Abandoned {
                    run_token,
                    error: e.to_string(),
                });
                return WatchState::Abandoned;
            }
        };

        let status = snapshot.status.clone();
        run.update_status(snapshot);
        let _ = ctx.events.send(RunEvent::StatusUpdated {
            run_token: run_token.clone(),
            status,
            complete: run.is_complete(),
        });
    }

    if cancel.is_cancelled() {
        return unwatched(ctx, run_token);
    }

    dispatch(run, &ctx.registry, &ctx.events, &ctx.handler_log).await;
    WatchState::Completed
}

/// Fetch the run's status, retrying transient failures per the policy.
async fn fetch_status(
    run: &Run,
    ctx: &WatchContext,
    cancel: &CancellationToken,
) -> Result<RunResponse, FetchAbort> {
    let mut delay = ctx.retry.initial_delay;
    let mut attempt = 0u32;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchAbort::Cancelled),
            result = ctx.remote.get_run(run.token()) => result,
        };

        let err = match result {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) => e,
        };

        if err.is_auth() || !err.is_transient() || attempt >= ctx.retry.max_retries {
            return Err(FetchAbort::Failed(err));
        }

        attempt += 1;
        tracing::warn!(
            run_token = %run.token(),
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "Status fetch attempt {attempt} failed, retrying",
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchAbort::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, &ctx.retry);
    }
}

fn unwatched(ctx: &WatchContext, run_token: String) -> WatchState {
    tracing::debug!(run_token = %run_token, "Watch cancelled");
    let _ = ctx.events.send(RunEvent::Unwatched { run_token });
    WatchState::Idle
}
