//! Domain DTOs for the ACI API.
//!
//! # Design
//! These types mirror the server's schema but are defined independently of
//! the mock-server crate; integration tests catch drift between the two.
//! Search parameters are validated locally before a request is built.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Largest page size the API accepts.
pub const MAX_LIMIT: u32 = 1000;

/// LLM vendor whose tool-schema format the server should render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    #[default]
    OpenAi,
    Anthropic,
}

impl InferenceProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceProvider::OpenAi => "openai",
            InferenceProvider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for InferenceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InferenceProvider {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(InferenceProvider::OpenAi),
            "anthropic" => Ok(InferenceProvider::Anthropic),
            other => Err(ApiError::InvalidArgument(format!(
                "unknown inference provider: {other}"
            ))),
        }
    }
}

/// Filters for `GET apps/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAppsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Only return apps the calling agent is allowed to use.
    #[serde(default, deserialize_with = "null_as_false")]
    pub allowed_apps_only: bool,
    /// Embed each app's functions in the results.
    #[serde(default, deserialize_with = "null_as_false")]
    pub include_functions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl SearchAppsParams {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_limit(self.limit)
    }

    /// Render as query pairs, omitting unset options.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(intent) = &self.intent {
            query.push(("intent".to_string(), intent.clone()));
        }
        query.push(("allowed_apps_only".to_string(), self.allowed_apps_only.to_string()));
        query.push(("include_functions".to_string(), self.include_functions.to_string()));
        for category in self.categories.iter().flatten() {
            query.push(("categories".to_string(), category.clone()));
        }
        push_page(&mut query, self.limit, self.offset);
        query
    }
}

/// Filters for `GET functions/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFunctionsParams {
    /// Restrict results to these apps; `None` searches across all apps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Only return functions of apps that have a linked account configured.
    #[serde(default, deserialize_with = "null_as_false")]
    pub configured_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl SearchFunctionsParams {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_limit(self.limit)
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        for app in self.app_names.iter().flatten() {
            query.push(("app_names".to_string(), app.clone()));
        }
        if let Some(intent) = &self.intent {
            query.push(("intent".to_string(), intent.clone()));
        }
        query.push(("configured_only".to_string(), self.configured_only.to_string()));
        push_page(&mut query, self.limit, self.offset);
        query
    }
}

/// Tool calls send `null` for flags they leave unset.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn push_page(query: &mut Vec<(String, String)>, limit: Option<u32>, offset: Option<u32>) {
    if let Some(limit) = limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = offset {
        query.push(("offset".to_string(), offset.to_string()));
    }
}

fn validate_limit(limit: Option<u32>) -> Result<(), ApiError> {
    match limit {
        Some(limit) if limit == 0 || limit > MAX_LIMIT => Err(ApiError::InvalidArgument(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        ))),
        _ => Ok(()),
    }
}

/// An app as returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<Function>>,
}

/// Full representation of an app, returned by `GET apps/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDetails {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub provider: String,
    pub version: String,
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub categories: Vec<String>,
    pub visibility: String,
    pub active: bool,
    pub security_schemes: Vec<String>,
    pub functions: Vec<FunctionDetails>,
}

/// A function as returned by search.
///
/// The name prefix before `__` is the owning app, e.g.
/// `BRAVE_SEARCH__WEB_SEARCH` belongs to `BRAVE_SEARCH`. The server adds
/// functions dynamically, so the constants here are not exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub description: String,
}

impl Function {
    pub const BRAVE_SEARCH__WEB_SEARCH: &'static str = "BRAVE_SEARCH__WEB_SEARCH";

    pub fn app_name(&self) -> &str {
        app_name_of(&self.name)
    }
}

/// App prefix of a function name; the whole name if it has no `__`.
pub fn app_name_of(function_name: &str) -> &str {
    function_name
        .split_once("__")
        .map(|(app, _)| app)
        .unwrap_or(function_name)
}

/// A function as embedded in `AppDetails`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDetails {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// JSON schema of the function's input; `{}` when the server omits it.
    #[serde(default = "empty_object")]
    pub parameters: serde_json::Value,
}

fn default_active() -> bool {
    true
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Request body for `POST functions/{name}/execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExecution {
    pub function_input: serde_json::Map<String, serde_json::Value>,
    pub linked_account_owner_id: String,
}

/// Outcome of executing an indexed function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
