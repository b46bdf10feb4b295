//! Project handles.

use std::sync::Arc;

use hubwatch_core::{ProjectResponse, ProjectRunParams, RunResponse};
use serde::de::DeserializeOwned;

use crate::error::ParseHubError;
use crate::handler::RunHandler;
use crate::run::Run;
use crate::tracker::ParseHub;

/// A ParseHub project together with the client it was loaded through.
#[derive(Clone)]
pub struct Project {
    hub: ParseHub,
    response: ProjectResponse,
}

impl Project {
    pub(crate) fn new(hub: ParseHub, response: ProjectResponse) -> Self {
        Self { hub, response }
    }

    pub fn token(&self) -> &str {
        &self.response.token
    }

    pub fn title(&self) -> &str {
        &self.response.title
    }

    /// The project as ParseHub last described it.
    pub fn response(&self) -> &ProjectResponse {
        &self.response
    }

    pub fn last_run(&self) -> Option<&RunResponse> {
        self.response.last_run.as_ref()
    }

    pub fn last_ready_run(&self) -> Option<&RunResponse> {
        self.response.last_ready_run.as_ref()
    }

    /// Start a run of this project. See [`ParseHub::run_project`].
    pub async fn run(
        &self,
        params: &ProjectRunParams,
        handler: Option<Arc<dyn RunHandler>>,
    ) -> Result<Arc<Run>, ParseHubError> {
        self.hub.run_project(self.token(), params, handler).await
    }

    /// Decode the data of this project's most recent ready run.
    pub async fn load_last_ready_data<T: DeserializeOwned>(&self) -> Result<T, ParseHubError> {
        self.hub.load_last_ready_data(self.token()).await
    }

    /// Reload the project description.
    pub async fn refresh(&mut self) -> Result<(), ParseHubError> {
        let fresh = self.hub.get_project(self.token()).await?;
        self.response = fresh.response;
        Ok(())
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("token", &self.response.token)
            .field("title", &self.response.title)
            .finish()
    }
}
