//! Failure taxonomy shared by every upstream call.
//!
//! Callers decide retry / abort / degrade from the classification helpers;
//! nothing here is ever swallowed.

use thiserror::Error;

use crate::retry::Canceled;

pub type Result<T, E = GenError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GenError {
    /// Non-2xx answer from the provider. Body kept verbatim for classification.
    #[error("{status} — {body}")]
    Upstream { status: u16, body: String },

    /// Stored without its URL, which carries the API key.
    #[error("transport error: {0}")]
    Http(reqwest::Error),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("malformed response from model: {0}")]
    MalformedResponse(String),

    #[error("response JSON has no `sections` array")]
    MissingSections,

    #[error("response carried no {0} payload")]
    MissingPayload(&'static str),

    #[error("request canceled")]
    Canceled,

    #[error("invalid generation parameters: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<reqwest::Error> for GenError {
    fn from(e: reqwest::Error) -> Self {
        GenError::Http(e.without_url())
    }
}

impl From<Canceled> for GenError {
    fn from(_: Canceled) -> Self {
        GenError::Canceled
    }
}

impl GenError {
    /// Provider temporarily overloaded. Decided on the rendered text, the same
    /// way for HTTP statuses and transport failures.
    pub fn is_transient(&self) -> bool {
        match self {
            GenError::Upstream { .. } | GenError::Http(_) => {
                is_transient_message(&self.to_string())
            }
            _ => false,
        }
    }

    /// Rate limit / resource exhausted (the speech endpoint reports this when
    /// the session quota is used up).
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            GenError::Upstream { .. } | GenError::Http(_) => {
                is_quota_message(&self.to_string())
            }
            _ => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, GenError::MalformedResponse(_) | GenError::MissingSections)
    }
}

pub fn is_transient_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("503") || lower.contains("unavailable")
}

pub fn is_quota_message(msg: &str) -> bool {
    msg.contains("429") || msg.contains("RESOURCE_EXHAUSTED")
}
