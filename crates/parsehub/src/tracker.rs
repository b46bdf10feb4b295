//! The caller-facing ParseHub client with background run tracking.
//!
//! [`ParseHub`] owns the [`RunRegistry`], spawns one watch task per
//! tracked run, and exposes the synchronous remote operations. Handles are
//! cheap to clone and share one registry.

use std::sync::Arc;

use hubwatch_core::{CoreError, ProjectRunParams, RunResponse};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;

use crate::api::ParseHubApi;
use crate::config::TrackerConfig;
use crate::error::ParseHubError;
use crate::events::RunEvent;
use crate::handler::RunHandler;
use crate::logging;
use crate::project::Project;
use crate::registry::RunRegistry;
use crate::remote::RemoteClient;
use crate::run::Run;
use crate::watcher::{run_watch, WatchContext};

/// Broadcast channel capacity for run events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// ParseHub client plus the tracker for its in-flight runs.
#[derive(Clone)]
pub struct ParseHub {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Arc<dyn RemoteClient>,
    registry: Arc<RunRegistry>,
    config: TrackerConfig,
    events: broadcast::Sender<RunEvent>,
    /// Log sink for watch tasks, which have no caller of their own.
    log_sink: Dispatch,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
    tasks: TaskTracker,
}

/// Builder for [`ParseHub`] around any [`RemoteClient`].
pub struct ParseHubBuilder {
    remote: Arc<dyn RemoteClient>,
    config: TrackerConfig,
    log_sink: Option<Dispatch>,
}

impl ParseHubBuilder {
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Where watch tasks log. Defaults to a sink that discards everything.
    pub fn log_sink(mut self, sink: Dispatch) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn build(self) -> ParseHub {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        ParseHub {
            inner: Arc::new(Inner {
                remote: self.remote,
                registry: Arc::new(RunRegistry::new()),
                config: self.config,
                events,
                log_sink: self.log_sink.unwrap_or_else(logging::noop_sink),
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
            }),
        }
    }
}

impl ParseHub {
    /// Client for the public API with default configuration.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ParseHubError> {
        Self::from_config(api_key, TrackerConfig::default())
    }

    /// Client for the API described by `config`.
    pub fn from_config(
        api_key: impl Into<String>,
        config: TrackerConfig,
    ) -> Result<Self, ParseHubError> {
        tracing::debug!(base_url = %config.base_url, "Creating ParseHub client");
        let api = ParseHubApi::from_config(api_key, &config)?;
        Ok(Self::builder(Arc::new(api)).config(config).build())
    }

    pub fn builder(remote: Arc<dyn RemoteClient>) -> ParseHubBuilder {
        ParseHubBuilder {
            remote,
            config: TrackerConfig::default(),
            log_sink: None,
        }
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Subscribe to run lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.inner.events.subscribe()
    }

    // ---- projects ----

    /// Every project in the account.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ParseHubError> {
        let listing = self.inner.remote.list_projects().await?;
        tracing::debug!(count = listing.projects.len(), "Loaded ParseHub projects");
        Ok(listing
            .projects
            .into_iter()
            .map(|response| Project::new(self.clone(), response))
            .collect())
    }

    pub async fn get_project(&self, project_token: &str) -> Result<Project, ParseHubError> {
        let response = self.inner.remote.get_project(project_token).await?;
        Ok(Project::new(self.clone(), response))
    }

    /// Start a run of a project.
    ///
    /// Returns as soon as ParseHub accepts the run. With a handler, a watch
    /// starts in the background and the handler is called once the run
    /// finishes. Without one (webhook users) the run is only registered.
    pub async fn run_project(
        &self,
        project_token: &str,
        params: &ProjectRunParams,
        handler: Option<Arc<dyn RunHandler>>,
    ) -> Result<Arc<Run>, ParseHubError> {
        let response = self.inner.remote.submit_run(project_token, params).await?;
        if response.run_token.is_empty() {
            return Err(CoreError::Validation("run response has no run_token".into()).into());
        }

        tracing::info!(
            project_token,
            run_token = %response.run_token,
            "ParseHub run started",
        );

        let run = self.register(response).await;
        if let Some(handler) = handler {
            self.watch(&run, handler);
        }
        Ok(run)
    }

    /// Decode the data of a project's most recent ready run.
    pub async fn load_last_ready_data<T: DeserializeOwned>(
        &self,
        project_token: &str,
    ) -> Result<T, ParseHubError> {
        let body = self.inner.remote.get_last_ready_data(project_token).await?;
        decode_body(&body)
    }

    // ---- runs ----

    /// Fetch a run's status and record it in the registry.
    pub async fn get_run(&self, run_token: &str) -> Result<Arc<Run>, ParseHubError> {
        let response = self.inner.remote.get_run(run_token).await?;
        let run = self.inner.registry.get_or_create(run_token).await;
        run.update_status(response);
        Ok(run)
    }

    /// Re-fetch the status of a run.
    pub async fn refresh_run(&self, run: &Run) -> Result<Arc<RunResponse>, ParseHubError> {
        let response = self.inner.remote.get_run(run.token()).await?;
        run.update_status(response);
        Ok(run.status().unwrap_or_default())
    }

    /// Decode the data extracted by a run into `T`.
    pub async fn load_run_data<T: DeserializeOwned>(
        &self,
        run_token: &str,
    ) -> Result<T, ParseHubError> {
        tracing::debug!(run_token, "Loading run data");
        let body = self.inner.remote.get_run_data(run_token).await?;
        decode_body(&body)
    }

    /// Cancel a run. Data extracted so far stays available.
    ///
    /// A watched run becomes terminal and its handler is dispatched at the
    /// next poll tick.
    pub async fn cancel_run(&self, run_token: &str) -> Result<Arc<Run>, ParseHubError> {
        let response = self.inner.remote.cancel_run(run_token).await?;
        tracing::info!(run_token, "ParseHub run cancelled");
        let run = self.inner.registry.get_or_create(run_token).await;
        run.update_status(response);
        Ok(run)
    }

    /// Delete a run and its data on ParseHub, stop any watch on it and drop
    /// it from the registry. Returns the final status ParseHub reported.
    ///
    /// If ParseHub refuses the deletion, the run stays registered.
    pub async fn delete_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        let response = self.inner.remote.delete_run(run_token).await?;

        if let Some(run) = self.inner.registry.remove(run_token).await {
            run.cancel_watch();
            run.update_status(response.clone());
        }

        tracing::info!(run_token, "ParseHub run deleted");
        let _ = self.inner.events.send(RunEvent::Removed {
            run_token: run_token.to_string(),
        });
        Ok(response)
    }

    /// Register a run from a webhook body.
    ///
    /// The payload becomes the run's status. An existing record for the
    /// same token is reused.
    pub async fn load_run_from_bytes(&self, body: &[u8]) -> Result<Arc<Run>, ParseHubError> {
        let response: RunResponse = serde_json::from_slice(body).map_err(|e| {
            let text = String::from_utf8_lossy(body);
            tracing::warn!(error = %e, body = %text, "Problem decoding run payload");
            ParseHubError::decode(e, &text)
        })?;

        if response.run_token.is_empty() {
            return Err(CoreError::Validation("run payload has no run_token".into()).into());
        }

        Ok(self.register(response).await)
    }

    // ---- watches ----

    /// Start watching a run in the background.
    ///
    /// Sets `handler` unless the run already has one. Requesting a watch
    /// for a run that is already watched, or already completed, is a no-op.
    /// Returns whether a new watch was started. Must be called from within
    /// a Tokio runtime.
    ///
    /// The poll loop logs to the tracker's sink; the handler logs to the
    /// dispatcher current at this call.
    pub fn watch(&self, run: &Arc<Run>, handler: Arc<dyn RunHandler>) -> bool {
        if !run.set_handler(handler) {
            tracing::debug!(run_token = %run.token(), "Run already has a handler, keeping it");
        }

        let cancel = self.inner.cancel.child_token();
        if let Err(state) = run.try_begin_watch(&cancel) {
            tracing::warn!(
                run_token = %run.token(),
                ?state,
                "Watch requested for run that is not idle, ignoring",
            );
            return false;
        }

        let ctx = WatchContext {
            remote: Arc::clone(&self.inner.remote),
            registry: Arc::clone(&self.inner.registry),
            events: self.inner.events.clone(),
            poll_interval: self.inner.config.poll_interval,
            retry: self.inner.config.retry.clone(),
            handler_log: tracing::dispatcher::get_default(|d| d.clone()),
        };

        self.inner.tasks.spawn(
            run_watch(Arc::clone(run), ctx, cancel).with_subscriber(self.inner.log_sink.clone()),
        );
        true
    }

    /// Stop the watch on a run without calling its handler. The run stays
    /// registered and may be watched again. Returns whether a watch was
    /// active.
    pub async fn unwatch(&self, run_token: &str) -> bool {
        match self.inner.registry.get(run_token).await {
            Some(run) => run.cancel_watch(),
            None => false,
        }
    }

    /// Number of watch tasks still running.
    pub fn active_watches(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Cancel every watch and wait for the tasks to exit, up to the
    /// configured shutdown timeout.
    pub async fn shutdown(&self) {
        tracing::info!(active = self.inner.tasks.len(), "Shutting down run tracker");
        self.inner.cancel.cancel();
        self.inner.tasks.close();

        if tokio::time::timeout(self.inner.config.shutdown_timeout, self.inner.tasks.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.inner.tasks.len(),
                "Watch tasks did not exit before the shutdown timeout",
            );
        }
    }

    // ---- private helpers ----

    async fn register(&self, response: RunResponse) -> Arc<Run> {
        let run = self
            .inner
            .registry
            .get_or_create(&response.run_token)
            .await;
        run.update_status(response);
        run
    }
}

impl std::fmt::Debug for ParseHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseHub")
            .field("config", &self.inner.config)
            .field("active_watches", &self.inner.tasks.len())
            .finish()
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ParseHubError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, "Problem decoding run data");
        ParseHubError::decode(e, body)
    })
}
