//! Error types for the ACI API client.
//!
//! # Design
//! Each status family the API documents gets its own variant carrying the
//! status code, a human-readable message and the raw body. `Server`,
//! `RateLimit` and `Unknown` are transient and may be retried by the host.

use thiserror::Error;

/// Errors returned by `AciClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400: the request was rejected by server-side validation.
    #[error("validation failed ({status}): {message}")]
    Validation { status: u16, message: String, body: String },

    /// 401: the API key is missing or invalid.
    #[error("authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String, body: String },

    /// 403: the key is valid but lacks access to the resource.
    #[error("permission denied ({status}): {message}")]
    Permission { status: u16, message: String, body: String },

    /// 404: the app, function or linked account does not exist.
    #[error("not found ({status}): {message}")]
    NotFound { status: u16, message: String, body: String },

    /// 429: the caller is being throttled.
    #[error("rate limited ({status}): {message}")]
    RateLimit { status: u16, message: String, body: String },

    /// 5xx.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String, body: String },

    /// Any other non-200 status.
    #[error("{message}")]
    Unknown { status: u16, message: String, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A caller-supplied value was rejected before any request was built.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ApiError {
    /// Map a non-200 response to its error variant.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        let body = body.to_string();
        match status {
            400 => ApiError::Validation { status, message, body },
            401 => ApiError::Authentication { status, message, body },
            403 => ApiError::Permission { status, message, body },
            404 => ApiError::NotFound { status, message, body },
            429 => ApiError::RateLimit { status, message, body },
            500..=599 => ApiError::Server { status, message, body },
            _ => ApiError::Unknown {
                status,
                message: format!("Unexpected error occurred. Status code: {status}"),
                body,
            },
        }
    }

    /// HTTP status of the response that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. }
            | ApiError::Authentication { status, .. }
            | ApiError::Permission { status, .. }
            | ApiError::NotFound { status, .. }
            | ApiError::RateLimit { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::Unknown { status, .. } => Some(*status),
            ApiError::Deserialization(_)
            | ApiError::Serialization(_)
            | ApiError::InvalidArgument(_) => None,
        }
    }

    /// Whether sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Server { .. } | ApiError::RateLimit { .. } | ApiError::Unknown { .. }
        )
    }
}

/// Prefer the JSON `message`, then `error`, then the raw text.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    if let Some(serde_json::Value::Object(map)) = parsed {
        for key in ["message", "error"] {
            match map.get(key) {
                None | Some(serde_json::Value::Null) => continue,
                Some(serde_json::Value::String(s)) if s.is_empty() => continue,
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(other) => return other.to_string(),
            }
        }
    }
    body.to_string()
}
