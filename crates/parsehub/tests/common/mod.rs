//! Shared fixtures for tracker integration tests.
//!
//! [`FakeRemote`] replays a scripted sequence of status fetches so the
//! poll loop can be driven deterministically under a paused clock.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hubwatch_core::{ProjectResponse, ProjectRunParams, ProjectsResponse, RunResponse, RunStatus};
use hubwatch_parsehub::{
    HandlerError, ParseHub, ParseHubError, RemoteClient, Run, RunHandler, TrackerConfig,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One scripted answer to `get_run`.
#[derive(Debug, Clone)]
pub enum Step {
    Status(RunResponse),
    Unauthorized,
    ServerError,
}

impl Step {
    fn into_result(self) -> Result<RunResponse, ParseHubError> {
        match self {
            Step::Status(response) => Ok(response),
            Step::Unauthorized => Err(ParseHubError::Unauthorized),
            Step::ServerError => Err(ParseHubError::Status {
                status: 502,
                body: "bad gateway".into(),
            }),
        }
    }
}

pub fn snapshot(run_token: &str, status: RunStatus) -> RunResponse {
    RunResponse {
        project_token: "P1".into(),
        run_token: run_token.into(),
        status: Some(status),
        ..Default::default()
    }
}

pub fn running(run_token: &str) -> Step {
    Step::Status(snapshot(run_token, RunStatus::Running))
}

pub fn complete(run_token: &str) -> Step {
    Step::Status(RunResponse {
        end_time: Some("2024-01-01T00:00:00Z".into()),
        data_ready: true,
        ..snapshot(run_token, RunStatus::Complete)
    })
}

/// Scripted [`RemoteClient`].
///
/// `get_run` pops the next step; once the script runs out the last step
/// repeats.
pub struct FakeRemote {
    submit_token: String,
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    data: String,
    fetches: AtomicUsize,
    submitted: Mutex<Vec<(String, ProjectRunParams)>>,
    deleted: Mutex<Vec<String>>,
    reject_deletes: AtomicBool,
    cancelled: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new(submit_token: &str, script: Vec<Step>) -> Self {
        Self {
            submit_token: submit_token.to_string(),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            data: r#"{"listings":[{"title":"a"},{"title":"b"}]}"#.to_string(),
            fetches: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            reject_deletes: AtomicBool::new(false),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(String, ProjectRunParams)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Answer every later `delete_run` with 401.
    pub fn reject_deletes(&self) {
        self.reject_deletes.store(true, Ordering::SeqCst);
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    fn next_step(&self) -> Step {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(step) = script.pop_front() {
            *last = Some(step.clone());
            step
        } else {
            last.clone().unwrap_or(Step::ServerError)
        }
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn list_projects(&self) -> Result<ProjectsResponse, ParseHubError> {
        Ok(ProjectsResponse {
            projects: vec![ProjectResponse {
                token: "P1".into(),
                title: "Listings".into(),
                ..Default::default()
            }],
            total_projects: Some(1),
        })
    }

    async fn get_project(&self, project_token: &str) -> Result<ProjectResponse, ParseHubError> {
        Ok(ProjectResponse {
            token: project_token.into(),
            title: "Listings".into(),
            ..Default::default()
        })
    }

    async fn submit_run(
        &self,
        project_token: &str,
        params: &ProjectRunParams,
    ) -> Result<RunResponse, ParseHubError> {
        params.form_fields()?;
        self.submitted
            .lock()
            .unwrap()
            .push((project_token.to_string(), params.clone()));
        Ok(RunResponse {
            project_token: project_token.into(),
            ..snapshot(&self.submit_token, RunStatus::Initialized)
        })
    }

    async fn get_run(&self, _run_token: &str) -> Result<RunResponse, ParseHubError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.next_step().into_result()
    }

    async fn get_run_data(&self, _run_token: &str) -> Result<String, ParseHubError> {
        Ok(self.data.clone())
    }

    async fn get_last_ready_data(&self, _project_token: &str) -> Result<String, ParseHubError> {
        Ok(self.data.clone())
    }

    async fn cancel_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        self.cancelled.lock().unwrap().push(run_token.to_string());
        Ok(RunResponse {
            end_time: Some("2024-01-01T00:00:00Z".into()),
            ..snapshot(run_token, RunStatus::Cancelled)
        })
    }

    async fn delete_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        if self.reject_deletes.load(Ordering::SeqCst) {
            return Err(ParseHubError::Unauthorized);
        }
        self.deleted.lock().unwrap().push(run_token.to_string());
        Ok(snapshot(run_token, RunStatus::Cancelled))
    }
}

/// Handler that records every invocation and reports a fixed outcome.
#[derive(Default)]
pub struct RecordingHandler {
    fail: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Option<RunStatus>)>>,
}

impl RecordingHandler {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(run token, status at dispatch)` per invocation.
    pub fn seen(&self) -> Vec<(String, Option<RunStatus>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RunHandler for RecordingHandler {
    async fn handle(&self, run: Arc<Run>) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let status = run.status().and_then(|s| s.status.clone());
        self.seen
            .lock()
            .unwrap()
            .push((run.token().to_string(), status));
        if self.fail {
            anyhow::bail!("handler rejected run {}", run.token());
        }
        Ok(())
    }
}

/// Tracker over `remote` polling every [`POLL_INTERVAL`].
pub fn tracker(remote: Arc<FakeRemote>) -> ParseHub {
    tracker_with(remote, TrackerConfig::default().with_poll_interval(POLL_INTERVAL))
}

pub fn tracker_with(remote: Arc<FakeRemote>, config: TrackerConfig) -> ParseHub {
    ParseHub::builder(remote).config(config).build()
}
