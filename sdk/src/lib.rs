//! Blocking client SDK for the ACI function-calling API.
//!
//! `aci-core` builds requests and parses responses; this crate sends them
//! over HTTP, retries transient failures with exponential backoff, loads
//! configuration from files and `AIPOLABS_*` environment variables, and logs
//! through `tracing`.
//!
//! ```no_run
//! use aci_sdk::{Aci, SearchFunctionsParams};
//!
//! # fn main() -> aci_sdk::Result<()> {
//! let aci = Aci::from_env()?;
//! let functions = aci.search_functions(&SearchFunctionsParams {
//!     intent: Some("search the web".to_string()),
//!     ..Default::default()
//! })?;
//! for function in functions {
//!     println!("{}: {}", function.name, function.description);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod transport;

pub use aci_core::{
    meta_function_schemas, ApiError, App, AppDetails, Function, FunctionCall, FunctionDetails,
    FunctionExecutionResult, InferenceProvider, MetaFunction, SearchAppsParams,
    SearchFunctionsParams,
};
pub use client::Aci;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{Error, Result, TransportError};
pub use retry::RetryPolicy;
pub use transport::{Transport, UreqTransport};
