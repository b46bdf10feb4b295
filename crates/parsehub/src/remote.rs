//! The seam between the tracker and the ParseHub service.
//!
//! The tracker only talks to ParseHub through [`RemoteClient`], so tests
//! can drive the poll loop with a scripted fake instead of HTTP.

use async_trait::async_trait;
use hubwatch_core::{ProjectResponse, ProjectRunParams, ProjectsResponse, RunResponse};

use crate::api::ParseHubApi;
use crate::error::ParseHubError;

/// Remote operations the tracker needs. Implementations must be safe to
/// call concurrently from many watch tasks.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_projects(&self) -> Result<ProjectsResponse, ParseHubError>;

    async fn get_project(&self, project_token: &str) -> Result<ProjectResponse, ParseHubError>;

    async fn submit_run(
        &self,
        project_token: &str,
        params: &ProjectRunParams,
    ) -> Result<RunResponse, ParseHubError>;

    async fn get_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError>;

    /// Raw extracted-data payload of a run.
    async fn get_run_data(&self, run_token: &str) -> Result<String, ParseHubError>;

    /// Raw data of the most recent ready run of a project.
    async fn get_last_ready_data(&self, project_token: &str) -> Result<String, ParseHubError>;

    async fn cancel_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError>;

    async fn delete_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError>;
}

#[async_trait]
impl RemoteClient for ParseHubApi {
    async fn list_projects(&self) -> Result<ProjectsResponse, ParseHubError> {
        ParseHubApi::list_projects(self).await
    }

    async fn get_project(&self, project_token: &str) -> Result<ProjectResponse, ParseHubError> {
        ParseHubApi::get_project(self, project_token).await
    }

    async fn submit_run(
        &self,
        project_token: &str,
        params: &ProjectRunParams,
    ) -> Result<RunResponse, ParseHubError> {
        self.run_project(project_token, params).await
    }

    async fn get_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        ParseHubApi::get_run(self, run_token).await
    }

    async fn get_run_data(&self, run_token: &str) -> Result<String, ParseHubError> {
        self.run_data(run_token).await
    }

    async fn get_last_ready_data(&self, project_token: &str) -> Result<String, ParseHubError> {
        self.last_ready_run_data(project_token).await
    }

    async fn cancel_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        ParseHubApi::cancel_run(self, run_token).await
    }

    async fn delete_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        ParseHubApi::delete_run(self, run_token).await
    }
}
