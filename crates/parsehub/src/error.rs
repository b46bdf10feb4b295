//! Error taxonomy for the ParseHub client and tracker.

use hubwatch_core::http_status::{BAD_REQUEST_MESSAGE, FORBIDDEN_MESSAGE, UNAUTHORIZED_MESSAGE};
use hubwatch_core::CoreError;

/// Longest response-body excerpt kept on an error.
const BODY_EXCERPT_CHARS: usize = 512;

/// Errors from talking to ParseHub.
#[derive(Debug, thiserror::Error)]
pub enum ParseHubError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ParseHub answered 400.
    #[error("{} {}", BAD_REQUEST_MESSAGE, .0)]
    BadRequest(String),

    /// ParseHub answered 401. The API key is wrong.
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    /// ParseHub answered 403. The API key lacks access.
    #[error("{}", FORBIDDEN_MESSAGE)]
    Forbidden,

    /// Any other non-2xx status.
    #[error("ParseHub API error ({status}): {body}")]
    Status {
        status: u16,
        /// Raw response body excerpt for debugging.
        body: String,
    },

    /// The body was not the JSON we expected.
    #[error("Failed to decode ParseHub response: {source}")]
    Decode {
        source: serde_json::Error,
        /// Excerpt of the body that failed to decode.
        body: String,
    },

    /// The request could not be built from the caller's parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] CoreError),
}

impl ParseHubError {
    pub(crate) fn decode(source: serde_json::Error, body: &str) -> Self {
        Self::Decode {
            source,
            body: excerpt(body),
        }
    }

    pub(crate) fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: excerpt(body),
        }
    }

    /// Whether ParseHub rejected the request itself (400/401/403).
    ///
    /// Repeating such a request cannot succeed.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::BadRequest(_) | Self::Unauthorized | Self::Forbidden)
    }

    /// Whether a later attempt of the same request might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Status { .. } | Self::Decode { .. }
        )
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        body.to_string()
    } else {
        let mut cut: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
