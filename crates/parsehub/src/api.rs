//! REST API client for the ParseHub v2 endpoints.
//!
//! Wraps project listing, run submission, status, data download,
//! cancellation and deletion using [`reqwest`]. Every request carries the
//! API key as `api_key`: in the query string for GET and DELETE, in the
//! form-encoded body for POST.

use hubwatch_core::http_status::{classify, StatusClass};
use hubwatch_core::{ProjectResponse, ProjectRunParams, ProjectsResponse, RunResponse};
use serde::de::DeserializeOwned;

use crate::config::TrackerConfig;
use crate::error::ParseHubError;

/// HTTP client for the ParseHub API.
pub struct ParseHubApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ParseHubApi {
    /// Create a client for the public ParseHub API with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ParseHubError> {
        Self::from_config(api_key, &TrackerConfig::default())
    }

    /// Create a client using the base URL and request timeout from
    /// `config`.
    pub fn from_config(
        api_key: impl Into<String>,
        config: &TrackerConfig,
    ) -> Result<Self, ParseHubError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, api_key, config.base_url.clone()))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET v2/projects`
    pub async fn list_projects(&self) -> Result<ProjectsResponse, ParseHubError> {
        let response = self.get("v2/projects").await?;
        Self::parse_response(response).await
    }

    /// `GET v2/projects/{token}`
    pub async fn get_project(&self, project_token: &str) -> Result<ProjectResponse, ParseHubError> {
        let response = self.get(&format!("v2/projects/{project_token}")).await?;
        Self::parse_response(response).await
    }

    /// `POST v2/projects/{token}/run`
    ///
    /// Starts a run on the ParseHub cloud and returns its initial status
    /// immediately. The run continues in the background.
    pub async fn run_project(
        &self,
        project_token: &str,
        params: &ProjectRunParams,
    ) -> Result<RunResponse, ParseHubError> {
        let mut form = params.form_fields()?;
        form.push(("api_key", self.api_key.clone()));

        tracing::debug!(project_token, ?params, "Starting ParseHub run");

        let response = self
            .client
            .post(self.url(&format!("v2/projects/{project_token}/run")))
            .form(&form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `GET v2/projects/{token}/last_ready_run/data`, undecoded.
    pub async fn last_ready_run_data(&self, project_token: &str) -> Result<String, ParseHubError> {
        let response = self
            .get(&format!("v2/projects/{project_token}/last_ready_run/data"))
            .await?;
        Self::read_body(response).await
    }

    /// `GET v2/runs/{token}`
    pub async fn get_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        let response = self.get(&format!("v2/runs/{run_token}")).await?;
        Self::parse_response(response).await
    }

    /// `GET v2/runs/{token}/data`, undecoded.
    ///
    /// ParseHub serves this gzip-encoded; the client decompresses it.
    pub async fn run_data(&self, run_token: &str) -> Result<String, ParseHubError> {
        let response = self.get(&format!("v2/runs/{run_token}/data")).await?;
        Self::read_body(response).await
    }

    /// `POST v2/runs/{token}/cancel`
    ///
    /// Data extracted so far stays available.
    pub async fn cancel_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        let response = self
            .client
            .post(self.url(&format!("v2/runs/{run_token}/cancel")))
            .form(&[("api_key", &self.api_key)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `DELETE v2/runs/{token}`
    ///
    /// Cancels the run if it is still going, then deletes it and its data.
    pub async fn delete_run(&self, run_token: &str) -> Result<RunResponse, ParseHubError> {
        let response = self
            .client
            .delete(self.url(&format!("v2/runs/{run_token}")))
            .query(&[("api_key", &self.api_key)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ParseHubError> {
        tracing::debug!(path, "ParseHub GET");
        Ok(self
            .client
            .get(self.url(path))
            .query(&[("api_key", &self.api_key)])
            .send()
            .await?)
    }

    /// Map the status code to an error kind, reading the body for the
    /// error message when there is one.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ParseHubError> {
        let status = response.status().as_u16();
        let class = classify(status);
        if class == StatusClass::Success {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        tracing::warn!(status, body = %body, "ParseHub HTTP response problem");

        Err(match class {
            StatusClass::BadRequest => ParseHubError::BadRequest(body),
            StatusClass::Unauthorized => ParseHubError::Unauthorized,
            StatusClass::Forbidden => ParseHubError::Forbidden,
            StatusClass::Success | StatusClass::Failure => ParseHubError::status(status, &body),
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ParseHubError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// The body is read as text first so a decode failure can report what
    /// ParseHub actually sent.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ParseHubError> {
        let body = Self::read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, body = %body, "Unmarshal error on ParseHub response");
            ParseHubError::decode(e, &body)
        })
    }
}
