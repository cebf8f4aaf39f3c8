//! Meta functions: tools an LLM calls to discover and run indexed functions.
//!
//! An agent usually gets the four meta-function schemas up front, then
//! searches apps and functions, fetches a definition, and executes it. Any
//! tool-call name that is not a meta function is treated as a direct call of
//! an indexed function (e.g. `BRAVE_SEARCH__WEB_SEARCH`).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::types::{InferenceProvider, SearchAppsParams, SearchFunctionsParams, MAX_LIMIT};

const INTENT_DESCRIPTION: &str = "Use this to find relevant functions you might need. Returned results of this function will be sorted by relevance to the intent. Examples include 'what's the top news in the stock market today', 'i want to automate outbound marketing emails'.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaFunction {
    SearchApps,
    SearchFunctions,
    GetFunctionDefinition,
    ExecuteFunction,
}

impl MetaFunction {
    pub const ALL: [MetaFunction; 4] = [
        MetaFunction::SearchApps,
        MetaFunction::SearchFunctions,
        MetaFunction::GetFunctionDefinition,
        MetaFunction::ExecuteFunction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetaFunction::SearchApps => "ACI_SEARCH_APPS",
            MetaFunction::SearchFunctions => "ACI_SEARCH_FUNCTIONS",
            MetaFunction::GetFunctionDefinition => "ACI_GET_FUNCTION_DEFINITION",
            MetaFunction::ExecuteFunction => "ACI_EXECUTE_FUNCTION",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetaFunction::SearchApps => "This function allows you to find relevant apps (which include a set of functions) that can help complete your tasks or get data and information you need.",
            MetaFunction::SearchFunctions => "This function allows you to find relevant executable functions that can help complete your tasks or get data and information you need.",
            MetaFunction::GetFunctionDefinition => "Get the definition of a function, including its name, description and input parameters. Call this before ACI_EXECUTE_FUNCTION to learn which arguments the function expects.",
            MetaFunction::ExecuteFunction => "Execute a function by name with the given arguments. Use ACI_GET_FUNCTION_DEFINITION first to learn the function's input parameters.",
        }
    }

    /// JSON schema of the tool's arguments.
    pub fn parameters(&self) -> Value {
        match self {
            MetaFunction::SearchApps => json!({
                "type": "object",
                "properties": {
                    "intent": {
                        "type": ["string", "null"],
                        "description": "Use this to find relevant apps you might need. Returned results of this function will be sorted by relevance to the intent. Examples include 'what's the top news in the stock market today', 'i want to automate outbound marketing emails'.",
                    },
                    "allowed_apps_only": flag_schema("If true, only return apps the agent is allowed to use."),
                    "include_functions": flag_schema("If true, include each app's functions in the results."),
                    "categories": {
                        "type": ["array", "null"],
                        "items": {"type": "string"},
                        "description": "Only return apps in at least one of these categories. Use null for all categories.",
                    },
                    "limit": limit_schema("apps"),
                    "offset": offset_schema(),
                },
                "required": ["intent", "limit", "offset"],
                "additionalProperties": false,
            }),
            MetaFunction::SearchFunctions => json!({
                "type": "object",
                "properties": {
                    "app_names": {
                        "type": ["array", "null"],
                        "items": {"type": "string"},
                        "description": "The names of the apps you want to search functions for. If provided, the search will be limited to the functions of the specified apps. Use null to search functions across all apps. You can find app names by first using the ACI_SEARCH_APPS function.",
                    },
                    "intent": {
                        "type": ["string", "null"],
                        "description": INTENT_DESCRIPTION,
                    },
                    "configured_only": flag_schema("If true, only return functions of apps with a linked account."),
                    "limit": limit_schema("functions"),
                    "offset": offset_schema(),
                },
                "required": ["app_names", "intent", "limit", "offset"],
                "additionalProperties": false,
            }),
            MetaFunction::GetFunctionDefinition => json!({
                "type": "object",
                "properties": {
                    "function_name": {
                        "type": "string",
                        "description": "The name of the function to get the definition for, e.g. BRAVE_SEARCH__WEB_SEARCH.",
                    },
                },
                "required": ["function_name"],
                "additionalProperties": false,
            }),
            MetaFunction::ExecuteFunction => json!({
                "type": "object",
                "properties": {
                    "function_name": {
                        "type": "string",
                        "description": "The name of the function to execute, as returned by ACI_GET_FUNCTION_DEFINITION.",
                    },
                    "function_arguments": {
                        "type": "object",
                        "description": "A dictionary containing all input arguments required to execute the specified function. Provide an empty object if the function takes no arguments.",
                        "additionalProperties": true,
                    },
                },
                "required": ["function_name", "function_arguments"],
                "additionalProperties": false,
            }),
        }
    }

    /// Tool schema in the format the given LLM vendor expects.
    pub fn schema(&self, provider: InferenceProvider) -> Value {
        match provider {
            InferenceProvider::OpenAi => json!({
                "type": "function",
                "function": {
                    "name": self.name(),
                    "description": self.description(),
                    "parameters": self.parameters(),
                },
            }),
            InferenceProvider::Anthropic => json!({
                "name": self.name(),
                "description": self.description(),
                "input_schema": self.parameters(),
            }),
        }
    }
}

fn limit_schema(what: &str) -> Value {
    json!({
        "type": ["integer", "null"],
        "default": 100,
        "description": format!("The maximum number of {what} to return from the search."),
        "minimum": 1,
        "maximum": MAX_LIMIT,
    })
}

fn flag_schema(description: &str) -> Value {
    json!({
        "type": ["boolean", "null"],
        "default": false,
        "description": description,
    })
}

fn offset_schema() -> Value {
    json!({
        "type": ["integer", "null"],
        "default": 0,
        "minimum": 0,
        "description": "Pagination offset.",
    })
}

/// Schemas of all meta functions, in a stable order.
pub fn meta_function_schemas(provider: InferenceProvider) -> Vec<Value> {
    MetaFunction::ALL.iter().map(|m| m.schema(provider)).collect()
}

#[derive(Debug, Clone, Deserialize)]
struct FunctionNameArgs {
    function_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ExecuteArgs {
    function_name: String,
    #[serde(default)]
    function_arguments: Value,
}

/// A validated tool call, ready to be turned into API requests.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionCall {
    SearchApps(SearchAppsParams),
    SearchFunctions(SearchFunctionsParams),
    GetFunctionDefinition { function_name: String },
    ExecuteFunction { function_name: String, arguments: Value },
    /// Any non-meta name: run that indexed function directly.
    Direct { function_name: String, arguments: Value },
}

impl FunctionCall {
    /// Validate tool-call arguments against the named function.
    ///
    /// `arguments` may be an object, `null`, or a JSON-encoded string.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ApiError> {
        let Some(meta) = MetaFunction::from_name(name) else {
            return Ok(FunctionCall::Direct {
                function_name: name.to_string(),
                arguments: arguments.clone(),
            });
        };
        let object = Value::Object(crate::client::normalize_arguments(arguments)?);
        match meta {
            MetaFunction::SearchApps => {
                let params: SearchAppsParams = decode(meta, object)?;
                params.validate()?;
                Ok(FunctionCall::SearchApps(params))
            }
            MetaFunction::SearchFunctions => {
                let params: SearchFunctionsParams = decode(meta, object)?;
                params.validate()?;
                Ok(FunctionCall::SearchFunctions(params))
            }
            MetaFunction::GetFunctionDefinition => {
                let args: FunctionNameArgs = decode(meta, object)?;
                Ok(FunctionCall::GetFunctionDefinition {
                    function_name: args.function_name,
                })
            }
            MetaFunction::ExecuteFunction => {
                let args: ExecuteArgs = decode(meta, object)?;
                Ok(FunctionCall::ExecuteFunction {
                    function_name: args.function_name,
                    arguments: args.function_arguments,
                })
            }
        }
    }
}

fn decode<T: DeserializeOwned>(meta: MetaFunction, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidArgument(format!("invalid arguments for {}: {e}", meta.name())))
}
