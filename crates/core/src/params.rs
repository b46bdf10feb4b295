//! Parameters for starting a project run.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Options accepted by `POST v2/projects/{token}/run`.
///
/// Every field is optional; ParseHub falls back to the project's own
/// defaults for anything left unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRunParams {
    /// URL to start running on. Defaults to the project's start site.
    pub start_url: Option<String>,

    /// Template to start with. Defaults to the project's start template.
    pub start_template: Option<String>,

    /// Starting global scope for the run, e.g. `{"query": "San Francisco"}`.
    /// Must be a JSON object.
    pub start_value_override: Option<serde_json::Value>,

    /// Ask ParseHub to email when the run completes or fails.
    pub send_email: bool,
}

impl ProjectRunParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = Some(url.into());
        self
    }

    pub fn with_start_template(mut self, template: impl Into<String>) -> Self {
        self.start_template = Some(template.into());
        self
    }

    pub fn with_start_value_override(mut self, value: serde_json::Value) -> Self {
        self.start_value_override = Some(value);
        self
    }

    pub fn with_send_email(mut self, send: bool) -> Self {
        self.send_email = send;
        self
    }

    /// Encode as form fields for the run request.
    ///
    /// Blank strings and an empty override object are omitted. An override
    /// that is not a JSON object is rejected.
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>, CoreError> {
        let mut fields = Vec::new();

        if let Some(url) = non_blank(&self.start_url) {
            fields.push(("start_url", url.to_string()));
        }

        if let Some(template) = non_blank(&self.start_template) {
            fields.push(("start_template", template.to_string()));
        }

        match &self.start_value_override {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::Object(map)) if map.is_empty() => {}
            Some(value @ serde_json::Value::Object(_)) => {
                fields.push(("start_value_override", serde_json::to_string(value)?));
            }
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "start_value_override must be a JSON object, got {}",
                    json_kind(other)
                )));
            }
        }

        if self.send_email {
            fields.push(("send_email", "1".to_string()));
        }

        Ok(fields)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
