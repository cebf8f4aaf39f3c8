//! Blocking client that runs core requests through a transport with retries.

use std::time::Duration;

use aci_core::{
    meta_function_schemas, AciClient, ApiError, App, AppDetails, Function,
    FunctionCall, FunctionExecutionResult, HttpRequest, HttpResponse, InferenceProvider,
    SearchAppsParams, SearchFunctionsParams,
};
use backon::BlockingRetryable;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::transport::{Transport, UreqTransport};

/// Client for the ACI API.
///
/// Every call is retried with exponential backoff while the failure is
/// retryable (5xx, 429, unexpected statuses, timeouts, connection errors).
pub struct Aci<T = UreqTransport> {
    core: AciClient,
    transport: T,
    retry: RetryPolicy,
    inference_provider: InferenceProvider,
}

impl Aci<UreqTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    /// Build a client from `AIPOLABS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::load(None)?)
    }
}

impl<T: Transport> Aci<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(Error::ApiKeyNotFound)?;
        Ok(Self {
            core: AciClient::new(&config.base_url, api_key),
            transport,
            retry: config.retry_policy(),
            inference_provider: config.inference_provider,
        })
    }

    pub fn base_url(&self) -> &str {
        self.core.base_url()
    }

    pub fn inference_provider(&self) -> InferenceProvider {
        self.inference_provider
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Tool schemas of the meta functions, formatted for this client's
    /// inference provider.
    pub fn meta_function_schemas(&self) -> Vec<Value> {
        meta_function_schemas(self.inference_provider)
    }

    /// Apps matching `params`, most relevant first.
    #[instrument(name = "Aci::search_apps", skip_all)]
    pub fn search_apps(&self, params: &SearchAppsParams) -> Result<Vec<App>> {
        info!(?params, "searching apps");
        let request = self.core.build_search_apps(params)?;
        self.call(&request, |response| self.core.parse_search_apps(response))
    }

    #[instrument(name = "Aci::get_app", skip_all)]
    pub fn get_app(&self, app_name: &str) -> Result<AppDetails> {
        info!(app_name, "getting app");
        let request = self.core.build_get_app(app_name)?;
        self.call(&request, |response| self.core.parse_get_app(response))
    }

    /// Functions matching `params`, most relevant first.
    #[instrument(name = "Aci::search_functions", skip_all)]
    pub fn search_functions(&self, params: &SearchFunctionsParams) -> Result<Vec<Function>> {
        info!(?params, "searching functions");
        let request = self.core.build_search_functions(params)?;
        self.call(&request, |response| self.core.parse_search_functions(response))
    }

    /// The function's tool schema in this client's inference-provider format.
    #[instrument(name = "Aci::get_function_definition", skip_all)]
    pub fn get_function_definition(&self, function_name: &str) -> Result<Value> {
        info!(function_name, provider = %self.inference_provider, "getting function definition");
        let request = self
            .core
            .build_get_function_definition(function_name, self.inference_provider)?;
        self.call(&request, |response| self.core.parse_get_function_definition(response))
    }

    /// Run an indexed function with the credentials of the given linked
    /// account owner.
    #[instrument(name = "Aci::execute_function", skip_all)]
    pub fn execute_function(
        &self,
        function_name: &str,
        function_arguments: &Value,
        linked_account_owner_id: &str,
    ) -> Result<FunctionExecutionResult> {
        info!(function_name, linked_account_owner_id, "executing function");
        let request = self.core.build_execute_function(
            function_name,
            function_arguments,
            linked_account_owner_id,
        )?;
        self.call(&request, |response| self.core.parse_execute_function(response))
    }

    /// Route an LLM tool call to the matching API operation.
    ///
    /// Meta-function names map to search, definition lookup or execution;
    /// any other name is executed directly as an indexed function.
    #[instrument(name = "Aci::handle_function_call", skip_all)]
    pub fn handle_function_call(
        &self,
        function_name: &str,
        function_arguments: &Value,
        linked_account_owner_id: &str,
    ) -> Result<Value> {
        info!(function_name, "handling function call");
        match FunctionCall::parse(function_name, function_arguments)? {
            FunctionCall::SearchApps(params) => to_json(&self.search_apps(&params)?),
            FunctionCall::SearchFunctions(params) => to_json(&self.search_functions(&params)?),
            FunctionCall::GetFunctionDefinition { function_name } => {
                self.get_function_definition(&function_name)
            }
            FunctionCall::ExecuteFunction {
                function_name,
                arguments,
            }
            | FunctionCall::Direct {
                function_name,
                arguments,
            } => to_json(&self.execute_function(
                &function_name,
                &arguments,
                linked_account_owner_id,
            )?),
        }
    }

    fn call<R>(
        &self,
        request: &HttpRequest,
        parse: impl Fn(HttpResponse) -> std::result::Result<R, ApiError>,
    ) -> Result<R> {
        let attempt = || -> Result<R> {
            debug!(?request, "sending request");
            let response = self.transport.send(request)?;
            debug!(status = response.status, "received response");
            Ok(parse(response)?)
        };

        attempt
            .retry(self.retry.backoff())
            .sleep(std::thread::sleep)
            .when(Error::is_retryable)
            .notify(|err: &Error, delay: Duration| {
                warn!("request to {} failed, retrying in {delay:?}: {err}", request.url);
            })
            .call()
    }
}

fn to_json<V: Serialize>(value: &V) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Serialization(e.to_string()).into())
}
