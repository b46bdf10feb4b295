//! Wire models for ParseHub REST responses.
//!
//! ParseHub's JSON is loosely typed: `data_ready` arrives as a bool or an
//! integer, `end_time` is `null` until a run stops, and `pages` and
//! `start_value` carry arbitrary JSON. Every field is therefore defaulted so
//! a partially populated body still decodes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::run_status::RunStatus;
use crate::types::{parse_timestamp, ProjectToken, RunToken, Timestamp};

/// Body of `GET v2/projects`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<ProjectResponse>,
    #[serde(default)]
    pub total_projects: Option<u64>,
}

/// A ParseHub project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectResponse {
    /// Globally unique id of the project.
    pub token: ProjectToken,

    /// Title given by the user when creating the project.
    pub title: String,

    /// JSON-stringified instructions for running the project.
    pub templates_json: Option<String>,

    /// Template ParseHub starts executing with.
    pub main_template: Option<String>,

    /// Default URL the project starts on.
    pub main_site: Option<String>,

    /// Advanced project options.
    #[serde(alias = "option_json")]
    pub options_json: Option<String>,

    /// Most recently started run (ordered by start time).
    pub last_run: Option<RunResponse>,

    /// Most recent run whose data is ready. May be the same run as
    /// `last_run`.
    pub last_ready_run: Option<RunResponse>,
}

/// Status snapshot of a ParseHub run.
///
/// This is both what the run endpoints return and what webhooks post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunResponse {
    pub project_token: ProjectToken,

    pub run_token: RunToken,

    /// `None` when the server omitted the field or sent `null`.
    pub status: Option<RunStatus>,

    /// Whether the extracted data can be downloaded. Always truthy for a
    /// complete run, may be either for a cancelled or failed one.
    #[serde(deserialize_with = "deserialize_flag")]
    pub data_ready: bool,

    pub start_time: Option<String>,

    /// Set once the run has stopped, `null` while initialized or running.
    pub end_time: Option<String>,

    /// Pages traversed so far. ParseHub is inconsistent about the type.
    pub pages: serde_json::Value,

    /// md5 of the results, useful to tell whether two runs differ.
    pub md5sum: Option<String>,

    pub start_url: Option<String>,

    pub start_template: Option<String>,

    /// Starting value of the global scope. Usually a JSON string.
    pub start_value: serde_json::Value,
}

impl RunResponse {
    /// Parsed `start_time`, if present and well formed.
    pub fn started_at(&self) -> Option<Timestamp> {
        self.start_time.as_deref().and_then(parse_timestamp)
    }

    /// Parsed `end_time`, if present and well formed.
    pub fn ended_at(&self) -> Option<Timestamp> {
        self.end_time.as_deref().and_then(parse_timestamp)
    }

    /// `pages` as a count when the server sent something numeric.
    pub fn page_count(&self) -> Option<u64> {
        match &self.pages {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Accept `true`/`false`, any number (non-zero is set), `"1"`/`"0"` style
/// strings and `null`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        _ => false,
    })
}
