//! Completion handlers and their dispatch.
//!
//! A handler receives a finished run and reports success or failure. On
//! success the run leaves the registry; on failure it stays so its final
//! status can still be inspected. Handlers are never retried.
//!
//! The handler runs under the dispatcher that was current where the watch
//! was requested, not the tracker's log sink, so its events reach the
//! caller's subscriber.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::broadcast;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;

use crate::events::RunEvent;
use crate::registry::RunRegistry;
use crate::run::Run;

/// Error type handlers report failure with.
pub type HandlerError = anyhow::Error;

/// Receives a run once it reaches a terminal state.
///
/// The handler may call back into the tracker (load data, delete the run);
/// those are ordinary remote calls and do not re-enter the poll loop.
#[async_trait]
pub trait RunHandler: Send + Sync {
    async fn handle(&self, run: Arc<Run>) -> Result<(), HandlerError>;
}

/// A [`RunHandler`] backed by an async closure. Build with [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a shareable [`RunHandler`].
///
/// ```ignore
/// let handler = handler_fn(|run: Arc<Run>| async move {
///     println!("{} finished", run.token());
///     Ok::<(), HandlerError>(())
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RunHandler>
where
    F: Fn(Arc<Run>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}

#[async_trait]
impl<F, Fut> RunHandler for HandlerFn<F>
where
    F: Fn(Arc<Run>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, run: Arc<Run>) -> Result<(), HandlerError> {
        (self.f)(run).await
    }
}

/// What happened when a finished run was handed to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler succeeded and the run was removed from the registry.
    Handled,
    /// The handler failed or panicked. The run is still registered.
    Failed,
    /// No handler was set. The run is still registered.
    NoHandler,
}

/// Invoke the run's handler once under `handler_log` and apply registry
/// cleanup.
pub(crate) async fn dispatch(
    run: &Arc<Run>,
    registry: &RunRegistry,
    events: &broadcast::Sender<RunEvent>,
    handler_log: &Dispatch,
) -> DispatchOutcome {
    let run_token = run.token().to_string();

    let Some(handler) = run.handler() else {
        tracing::warn!(run_token = %run_token, "Run finished without a handler");
        return DispatchOutcome::NoHandler;
    };

    tracing::debug!(run_token = %run_token, "Watch finished, handling run");

    let result = AssertUnwindSafe(
        handler
            .handle(Arc::clone(run))
            .with_subscriber(handler_log.clone()),
    )
    .catch_unwind()
    .await
    .unwrap_or_else(|_| Err(anyhow::anyhow!("handler panicked")));

    match result {
        Ok(()) => {
            registry.remove_if_same(run).await;
            tracing::info!(run_token = %run_token, "Run handled");
            let _ = events.send(RunEvent::Completed { run_token });
            DispatchOutcome::Handled
        }
        Err(e) => {
            tracing::warn!(run_token = %run_token, error = %e, "Handle run error");
            // Failures belong to the caller as well as the tracker sink.
            tracing::dispatcher::with_default(handler_log, || {
                tracing::warn!(run_token = %run_token, error = %e, "Run handler failed");
            });
            let _ = events.send(RunEvent::HandlerFailed {
                run_token,
                error: format!("{e:#}"),
            });
            DispatchOutcome::Failed
        }
    }
}
