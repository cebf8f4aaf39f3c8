//! Synchronous API client core for the ACI function-calling service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip and decides whether to retry, using
//! `ApiError::is_retryable`.
//!
//! # Design
//! - `AciClient` is stateless apart from its base URL and API key.
//! - Each API operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit.
//! - `meta` holds the LLM-facing meta functions: their tool schemas and the
//!   validation of tool-call arguments into a `FunctionCall`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod meta;
pub mod types;

pub use client::{normalize_arguments, AciClient};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, API_KEY_HEADER};
pub use meta::{meta_function_schemas, FunctionCall, MetaFunction};
pub use types::{
    App, AppDetails, Function, FunctionDetails, FunctionExecution, FunctionExecutionResult,
    InferenceProvider, SearchAppsParams, SearchFunctionsParams,
};
