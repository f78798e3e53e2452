//! Error handling for the FitCoach client
//!
//! Every failure leaving the request gateway is classified exactly once into
//! [`Error`]. Callers match on the variant instead of inspecting raw status
//! codes or response bodies.

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Unified error type for the FitCoach client
#[derive(Error, Debug)]
pub enum Error {
    /// 4xx rejection with field or message detail (shown inline on forms)
    #[error("Validation error ({status}): {detail}")]
    Validation {
        status: StatusCode,
        detail: ErrorDetail,
    },

    /// 401: the credential is missing, invalid or expired
    #[error("Unauthorized: {detail}")]
    Unauthorized { detail: ErrorDetail },

    /// 403: authenticated but not allowed (e.g. non-admin on an admin action)
    #[error("Forbidden: {detail}")]
    Forbidden { detail: ErrorDetail },

    /// 5xx from the backend
    #[error("Server error ({status}): {detail}")]
    Server {
        status: StatusCode,
        detail: ErrorDetail,
    },

    /// No response was received (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Credential store failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Rejected locally before anything was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl Error {
    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new invalid input error
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Classify a non-success HTTP response.
    pub(crate) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let detail = ErrorDetail::parse(body);
        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized { detail },
            StatusCode::FORBIDDEN => Error::Forbidden { detail },
            s if s.is_server_error() => Error::Server { status, detail },
            _ => Error::Validation { status, detail },
        }
    }

    /// HTTP status carried by the error, if the backend answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Validation { status, .. } | Error::Server { status, .. } => Some(*status),
            Error::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Error::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            Error::Network(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { detail, .. } => detail.to_string(),
            Error::Unauthorized {
                detail: ErrorDetail::Message(msg),
            } => msg.clone(),
            Error::Unauthorized { .. } => "Your session has ended. Please sign in again.".into(),
            Error::Forbidden { .. } => "You are not allowed to do that.".into(),
            Error::Network(_) => "Could not reach the server. Please try again.".into(),
            Error::InvalidInput(msg) => msg.clone(),
            _ => "Something went wrong. Please try again later.".into(),
        }
    }
}

/// One entry of a field-level validation failure
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    /// Location of the offending field, e.g. `["body", "email"]`
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl FieldError {
    /// Name of the field the error refers to (last path segment)
    pub fn field(&self) -> Option<String> {
        self.loc.last().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Server-provided error detail, kept as the backend sent it
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    /// `{"detail": "Incorrect username or password"}`
    Message(String),
    /// `{"detail": [{"loc": [...], "msg": "...", "type": "..."}]}`
    Fields(Vec<FieldError>),
    /// Anything else, verbatim
    Raw(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetailBody {
    Message { detail: String },
    Fields { detail: Vec<FieldError> },
}

impl ErrorDetail {
    pub(crate) fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice::<DetailBody>(body) {
            Ok(DetailBody::Message { detail }) => ErrorDetail::Message(detail),
            Ok(DetailBody::Fields { detail }) => ErrorDetail::Fields(detail),
            Err(_) => ErrorDetail::Raw(String::from_utf8_lossy(body).into_owned()),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDetail::Message(msg) => f.write_str(msg),
            ErrorDetail::Fields(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|e| match e.field() {
                        Some(field) => format!("{}: {}", field, e.msg),
                        None => e.msg.clone(),
                    })
                    .collect();
                f.write_str(&parts.join("; "))
            }
            ErrorDetail::Raw(text) => f.write_str(text),
        }
    }
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
