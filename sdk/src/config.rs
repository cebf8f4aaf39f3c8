//! Load client configuration via the `config` crate with env-override support.

use std::{fmt, path::Path, time::Duration};

use aci_core::InferenceProvider;
use serde::Deserialize;

use crate::error::Result;
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};

pub const DEFAULT_BASE_URL: &str = "https://api.aipolabs.xyz/v1/";

/// Environment variables are read as `AIPOLABS_<FIELD>`.
pub const ENV_PREFIX: &str = "AIPOLABS";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_min_wait_ms() -> u64 {
    DEFAULT_MIN_DELAY.as_millis() as u64
}

fn default_retry_max_wait_ms() -> u64 {
    DEFAULT_MAX_DELAY.as_millis() as u64
}

#[derive(Deserialize, Clone)]
pub struct ClientConfig {
    /// API key (`AIPOLABS_API_KEY`). Required to build a client.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the API (`AIPOLABS_BASE_URL`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Tool-schema format requested for function definitions
    /// (`AIPOLABS_INFERENCE_PROVIDER`).
    #[serde(default)]
    pub inference_provider: InferenceProvider,
    /// Per-request timeout in seconds (`AIPOLABS_TIMEOUT_SECS`).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per call, including the first (`AIPOLABS_MAX_ATTEMPTS`);
    /// `0` behaves like `1`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// First retry delay (`AIPOLABS_RETRY_MIN_WAIT_MS`).
    #[serde(default = "default_retry_min_wait_ms")]
    pub retry_min_wait_ms: u64,
    /// Retry delay cap (`AIPOLABS_RETRY_MAX_WAIT_MS`).
    #[serde(default = "default_retry_max_wait_ms")]
    pub retry_max_wait_ms: u64,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("inference_provider", &self.inference_provider)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_min_wait_ms", &self.retry_min_wait_ms)
            .field("retry_max_wait_ms", &self.retry_max_wait_ms)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            inference_provider: InferenceProvider::default(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_min_wait_ms: default_retry_min_wait_ms(),
            retry_max_wait_ms: default_retry_max_wait_ms(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Read an optional TOML file, then `AIPOLABS_*` environment variables.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        Self::load_from(explicit_path, config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Like `load`, with the environment source supplied by the caller.
    pub fn load_from(explicit_path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut cfg = config::Config::builder();
        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        }
        // Values stay strings; numeric fields are converted on deserialize so
        // keys like `0012345` are not rewritten.
        cfg = cfg.add_source(env);

        Ok(cfg.build()?.try_deserialize()?)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_inference_provider(mut self, provider: InferenceProvider) -> Self {
        self.inference_provider = provider;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.max_attempts = policy.max_attempts;
        self.retry_min_wait_ms = policy.min_delay.as_millis() as u64;
        self.retry_max_wait_ms = policy.max_delay.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            min_delay: Duration::from_millis(self.retry_min_wait_ms),
            max_delay: Duration::from_millis(self.retry_max_wait_ms),
        }
    }
}
