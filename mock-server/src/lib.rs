//! Mock of the ACI HTTP API for integration tests and local development.
//!
//! Every route counts its hits and can be told to fail the next N requests
//! with chosen statuses, which is how retry behavior is exercised.

pub mod catalog;

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub use catalog::{AppRecord, Catalog, FunctionRecord, SAMPLE_OWNER_ID};

/// API key the default state accepts.
pub const MOCK_API_KEY: &str = "test_api_key";

/// Path prefix all routes live under; clients use `http://host/v1/` as base.
pub const API_PREFIX: &str = "/v1";

const MAX_LIMIT: u32 = 1000;

type Failure = (StatusCode, Json<Value>);
type Reply = Result<Json<Value>, Failure>;
type QueryPairs = Query<Vec<(String, String)>>;

fn failure(status: StatusCode, message: impl Into<String>) -> Failure {
    (status, Json(json!({ "message": message.into() })))
}

#[derive(Debug)]
struct Inner {
    api_key: String,
    catalog: Catalog,
    faults: Mutex<HashMap<String, VecDeque<u16>>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// Shared server state. Cloning shares the same counters and fault queues.
#[derive(Clone, Debug)]
pub struct MockState {
    inner: Arc<Inner>,
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(MOCK_API_KEY, Catalog::sample())
    }
}

impl MockState {
    pub fn new(api_key: &str, catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(Inner {
                api_key: api_key.to_string(),
                catalog,
                faults: Mutex::new(HashMap::new()),
                hits: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Make the next requests to `route` (e.g. `"apps/search"`) fail with
    /// `statuses`, in order.
    pub fn fail_next(&self, route: &str, statuses: &[u16]) {
        let mut faults = self.inner.faults.lock().unwrap_or_else(PoisonError::into_inner);
        faults
            .entry(route.to_string())
            .or_default()
            .extend(statuses.iter().copied());
    }

    /// Requests received by `route`, including rejected ones.
    pub fn hits(&self, route: &str) -> usize {
        let hits = self.inner.hits.lock().unwrap_or_else(PoisonError::into_inner);
        hits.get(route).copied().unwrap_or(0)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Count the hit, replay an injected fault if any, then authenticate.
    fn admit(&self, route: &str, headers: &HeaderMap) -> Result<(), Failure> {
        {
            let mut hits = self.inner.hits.lock().unwrap_or_else(PoisonError::into_inner);
            *hits.entry(route.to_string()).or_default() += 1;
        }
        let fault = {
            let mut faults = self.inner.faults.lock().unwrap_or_else(PoisonError::into_inner);
            faults.get_mut(route).and_then(VecDeque::pop_front)
        };
        if let Some(status) = fault {
            tracing::debug!(route, status, "injecting failure");
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Err(failure(status, "injected failure"));
        }
        match headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
            Some(key) if key == self.inner.api_key => Ok(()),
            Some(_) => Err(failure(StatusCode::UNAUTHORIZED, "Invalid API key")),
            None => Err(failure(StatusCode::UNAUTHORIZED, "Missing API key")),
        }
    }
}

pub fn app() -> Router {
    router(MockState::default())
}

pub fn router(state: MockState) -> Router {
    let api = Router::new()
        .route("/apps/search", get(search_apps))
        .route("/apps/{name}", get(get_app))
        .route("/functions/search", get(search_functions))
        .route("/functions/{name}/definition", get(get_function_definition))
        .route("/functions/{name}/execute", post(execute_function))
        .with_state(state);
    Router::new().nest(API_PREFIX, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

fn first<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn all(query: &[(String, String)], key: &str) -> Option<Vec<String>> {
    let values: Vec<String> = query
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .collect();
    (!values.is_empty()).then_some(values)
}

fn flag(query: &[(String, String)], key: &str) -> Result<bool, Failure> {
    match first(query, key) {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(failure(
            StatusCode::BAD_REQUEST,
            format!("{key} must be a boolean, got {other:?}"),
        )),
    }
}

/// Parse `limit`/`offset`, enforcing the API's bounds.
fn page(query: &[(String, String)]) -> Result<(Option<usize>, usize), Failure> {
    let number = |key: &str| -> Result<Option<u32>, Failure> {
        first(query, key)
            .map(|v| {
                v.parse::<u32>().map_err(|_| {
                    failure(StatusCode::BAD_REQUEST, format!("{key} must be a non-negative integer"))
                })
            })
            .transpose()
    };
    let limit = number("limit")?;
    if let Some(limit) = limit {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                format!("limit must be between 1 and {MAX_LIMIT}"),
            ));
        }
    }
    let offset = number("offset")?.unwrap_or(0);
    Ok((limit.map(|l| l as usize), offset as usize))
}

fn function_summary(f: &FunctionRecord) -> Value {
    json!({ "name": f.name, "description": f.description })
}

async fn search_apps(State(state): State<MockState>, headers: HeaderMap, Query(query): QueryPairs) -> Reply {
    state.admit("apps/search", &headers)?;
    let intent = first(&query, "intent");
    let allowed_only = flag(&query, "allowed_apps_only")?;
    let include_functions = flag(&query, "include_functions")?;
    let categories = all(&query, "categories");
    let (limit, offset) = page(&query)?;

    let catalog = state.catalog();
    let candidates = catalog
        .apps
        .iter()
        .filter(|a| a.active)
        .filter(|a| !allowed_only || catalog.allowed_apps.contains(&a.name))
        .filter(|a| {
            categories
                .as_ref()
                .map_or(true, |cs| cs.iter().any(|c| a.categories.contains(c)))
        })
        .map(|a| {
            let score = catalog::relevance(intent, &format!("{} {}", a.name, a.description));
            (a, score)
        })
        .collect();

    let apps: Vec<Value> = catalog::rank_and_page(candidates, limit, offset)
        .into_iter()
        .map(|a| {
            let mut value = json!({ "name": a.name, "description": a.description });
            if include_functions {
                value["functions"] = a
                    .functions
                    .iter()
                    .filter(|f| f.active)
                    .map(function_summary)
                    .collect();
            }
            value
        })
        .collect();
    Ok(Json(Value::Array(apps)))
}

async fn get_app(State(state): State<MockState>, headers: HeaderMap, Path(name): Path<String>) -> Reply {
    state.admit(&format!("apps/{name}"), &headers)?;
    let app = state
        .catalog()
        .app(&name)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, format!("App {name} not found")))?;
    Ok(Json(json!(app)))
}

async fn search_functions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): QueryPairs,
) -> Reply {
    state.admit("functions/search", &headers)?;
    let intent = first(&query, "intent");
    let app_names = all(&query, "app_names");
    let configured_only = flag(&query, "configured_only")?;
    let (limit, offset) = page(&query)?;

    let catalog = state.catalog();
    let candidates = catalog
        .apps
        .iter()
        .filter(|a| a.active)
        .filter(|a| app_names.as_ref().map_or(true, |names| names.contains(&a.name)))
        .filter(|a| !configured_only || catalog.is_configured(&a.name))
        .flat_map(|a| a.functions.iter().filter(|f| f.active))
        .map(|f| {
            let score = catalog::relevance(intent, &format!("{} {}", f.name, f.description));
            (f, score)
        })
        .collect();

    let functions: Vec<Value> = catalog::rank_and_page(candidates, limit, offset)
        .into_iter()
        .map(function_summary)
        .collect();
    Ok(Json(Value::Array(functions)))
}

async fn get_function_definition(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): QueryPairs,
) -> Reply {
    state.admit(&format!("functions/{name}/definition"), &headers)?;
    let (_, function) = state
        .catalog()
        .function(&name)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, format!("Function {name} not found")))?;
    match first(&query, "inference_provider") {
        Some("openai") => Ok(Json(json!({
            "type": "function",
            "function": {
                "name": function.name,
                "strict": true,
                "description": function.description,
                "parameters": function.parameters,
            },
        }))),
        Some("anthropic") => Ok(Json(json!({
            "name": function.name,
            "description": function.description,
            "input_schema": function.parameters,
        }))),
        Some(other) => Err(failure(
            StatusCode::BAD_REQUEST,
            format!("Unsupported inference provider {other:?}"),
        )),
        None => Err(failure(StatusCode::BAD_REQUEST, "inference_provider is required")),
    }
}

#[derive(Deserialize)]
struct ExecuteRequest {
    #[serde(default)]
    function_input: serde_json::Map<String, Value>,
    linked_account_owner_id: String,
}

async fn execute_function(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    body: String,
) -> Reply {
    state.admit(&format!("functions/{name}/execute"), &headers)?;
    let input: ExecuteRequest = serde_json::from_str(&body)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}")))?;
    let catalog = state.catalog();
    let (app, function) = catalog
        .function(&name)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, format!("Function {name} not found")))?;
    if !catalog.is_linked(&app.name, &input.linked_account_owner_id) {
        return Err(failure(
            StatusCode::NOT_FOUND,
            format!(
                "Linked account not found for app {} and owner {}",
                app.name, input.linked_account_owner_id
            ),
        ));
    }
    tracing::debug!(function = %function.name, "executing");
    Ok(Json(json!({
        "success": true,
        "data": {
            "function": function.name,
            "input": input.function_input,
        },
    })))
}
