//! Stateless HTTP request builder and response parser for the ACI API.
//!
//! # Design
//! `AciClient` holds only the normalized base URL and the API key. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. The caller executes
//! the round-trip (and any retries) between the two.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, API_KEY_HEADER};
use crate::types::{
    App, AppDetails, Function, FunctionExecution, FunctionExecutionResult, InferenceProvider,
    SearchAppsParams, SearchFunctionsParams,
};

/// Synchronous, stateless client for the ACI API.
#[derive(Clone)]
pub struct AciClient {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for AciClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AciClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AciClient {
    /// The base URL always ends up with exactly one trailing slash.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn build_search_apps(&self, params: &SearchAppsParams) -> Result<HttpRequest, ApiError> {
        params.validate()?;
        Ok(self.get("apps/search", params.to_query()))
    }

    pub fn build_get_app(&self, app_name: &str) -> Result<HttpRequest, ApiError> {
        validate_name("app name", app_name)?;
        Ok(self.get(&format!("apps/{app_name}"), Vec::new()))
    }

    pub fn build_search_functions(
        &self,
        params: &SearchFunctionsParams,
    ) -> Result<HttpRequest, ApiError> {
        params.validate()?;
        Ok(self.get("functions/search", params.to_query()))
    }

    pub fn build_get_function_definition(
        &self,
        function_name: &str,
        inference_provider: InferenceProvider,
    ) -> Result<HttpRequest, ApiError> {
        validate_name("function name", function_name)?;
        Ok(self.get(
            &format!("functions/{function_name}/definition"),
            vec![(
                "inference_provider".to_string(),
                inference_provider.as_str().to_string(),
            )],
        ))
    }

    pub fn build_execute_function(
        &self,
        function_name: &str,
        function_arguments: &serde_json::Value,
        linked_account_owner_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        validate_name("function name", function_name)?;
        if linked_account_owner_id.is_empty() {
            return Err(ApiError::InvalidArgument(
                "linked_account_owner_id must not be empty".to_string(),
            ));
        }
        let body = FunctionExecution {
            function_input: normalize_arguments(function_arguments)?,
            linked_account_owner_id: linked_account_owner_id.to_string(),
        };
        self.post(&format!("functions/{function_name}/execute"), &body)
    }

    pub fn parse_search_apps(&self, response: HttpResponse) -> Result<Vec<App>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_app(&self, response: HttpResponse) -> Result<AppDetails, ApiError> {
        parse_json(response)
    }

    pub fn parse_search_functions(&self, response: HttpResponse) -> Result<Vec<Function>, ApiError> {
        parse_json(response)
    }

    /// Definitions are provider-specific tool schemas, so they stay untyped.
    pub fn parse_get_function_definition(
        &self,
        response: HttpResponse,
    ) -> Result<serde_json::Value, ApiError> {
        parse_json(response)
    }

    pub fn parse_execute_function(
        &self,
        response: HttpResponse,
    ) -> Result<FunctionExecutionResult, ApiError> {
        parse_json(response)
    }

    fn get(&self, path: &str, query: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{path}", self.base_url),
            query,
            headers: vec![(API_KEY_HEADER.to_string(), self.api_key.clone())],
            body: None,
        }
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers: vec![
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }
}

/// Decode a 200 body into `T`, mapping every other status to an `ApiError`.
///
/// An empty body decodes as JSON `null`.
fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, &response.body))
}

/// Names are interpolated into the URL path, so restrict them to a safe set.
fn validate_name(what: &str, name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::InvalidArgument(format!("{what} must not be empty")));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(ApiError::InvalidArgument(format!(
            "{what} {name:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}

/// Coerce tool-call arguments into a JSON object.
///
/// `null` becomes `{}`; a string is parsed as JSON, since LLM tool calls
/// usually deliver their arguments that way.
pub fn normalize_arguments(
    arguments: &serde_json::Value,
) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
    match arguments {
        serde_json::Value::Null => Ok(serde_json::Map::new()),
        serde_json::Value::Object(map) => Ok(map.clone()),
        serde_json::Value::String(raw) if raw.trim().is_empty() => Ok(serde_json::Map::new()),
        serde_json::Value::String(raw) => match serde_json::from_str(raw) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(ApiError::InvalidArgument(
                "function arguments must be a JSON object".to_string(),
            )),
            Err(e) => Err(ApiError::InvalidArgument(format!(
                "function arguments are not valid JSON: {e}"
            ))),
        },
        _ => Err(ApiError::InvalidArgument(
            "function arguments must be a JSON object".to_string(),
        )),
    }
}
