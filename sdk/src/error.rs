//! Error types for the SDK.

use aci_core::ApiError;
use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No API key was passed explicitly, found in the config file or in
    /// `AIPOLABS_API_KEY`.
    #[error("API key not found: pass one explicitly or set AIPOLABS_API_KEY")]
    ApiKeyNotFound,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Whether the request that produced this error should be sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(err) => err.is_retryable(),
            Error::Transport(err) => err.is_retryable(),
            Error::ApiKeyNotFound | Error::Config(_) => false,
        }
    }
}

/// The request never produced an HTTP response.
#[derive(Debug, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
    retryable: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            message: message.into(),
            retryable,
        }
    }

    /// Timeouts and connection failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}
