use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use validator::ValidationErrors;

use crate::repository::errors::RepositoryError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Registration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("session expired, please sign in again")]
    SessionExpired,

    #[error("{detail}")]
    RequestFailed { status: u16, detail: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// What the calling UI should offer the user for a given failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Reauthenticate,
    Retry,
    FixInput,
    Report,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RequestFailed { status, .. } => Some(*status),
            ClientError::SessionExpired => Some(401),
            _ => None,
        }
    }

    pub fn user_action(&self) -> UserAction {
        match self {
            ClientError::SessionExpired => UserAction::Reauthenticate,
            ClientError::Network(_) | ClientError::Timeout | ClientError::ResourceUnavailable(_) => {
                UserAction::Retry
            }
            ClientError::RequestFailed { status, .. } if *status >= 500 => UserAction::Retry,
            ClientError::InvalidCredentials(_)
            | ClientError::Registration(_)
            | ClientError::Validation(_)
            | ClientError::RequestFailed { .. } => UserAction::FixInput,
            ClientError::MalformedResponse(_) | ClientError::Storage(_) => UserAction::Report,
        }
    }

    pub(crate) fn encode(e: serde_json::Error) -> Self {
        ClientError::Validation(format!("request body could not be encoded: {e}"))
    }

    /// The URL is stripped first; query strings can carry credentials.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Network(e.without_url().to_string())
        }
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(e: ValidationErrors) -> Self {
        ClientError::Validation(e.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Human-readable reason from an error response body. Understands plain
/// `detail` strings, lists of field errors, and `message` bodies.
pub fn extract_detail(status: u16, body: &str) -> String {
    let fallback = || format!("HTTP {status}");

    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return fallback();
    };

    match parsed.detail {
        Some(Value::String(s)) if !s.trim().is_empty() => return s,
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return messages.join("; ");
            }
        }
        _ => {}
    }

    parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(fallback)
}
