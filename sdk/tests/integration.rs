//! End-to-end tests of the SDK against the mock server over real HTTP.
//!
//! Each test starts its own mock server on a random port and keeps a handle
//! to its state, so it can inject failures and count requests per route.

use std::time::Duration;

use aci_sdk::{
    Aci, ApiError, ClientConfig, Error, InferenceProvider, RetryPolicy, SearchAppsParams,
    SearchFunctionsParams,
};
use mock_server::{MockState, MOCK_API_KEY, SAMPLE_OWNER_ID};
use serde_json::json;

fn start_server() -> (String, MockState) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let state = MockState::default();
    let server_state = state.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_state(listener, server_state).await
        })
        .unwrap();
    });

    (format!("http://{addr}/v1"), state)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        min_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

fn client_with_key(base_url: &str, api_key: &str) -> Aci {
    let config = ClientConfig::new(api_key)
        .with_base_url(base_url)
        .with_retry_policy(fast_retry());
    Aci::new(config).unwrap()
}

fn client(base_url: &str) -> Aci {
    client_with_key(base_url, MOCK_API_KEY)
}

#[test]
fn discovery_flow() {
    let (base_url, state) = start_server();
    let aci = client(&base_url);
    assert_eq!(aci.base_url(), format!("{base_url}/"));

    // Step 1: find an app for the task.
    let apps = aci
        .search_apps(&SearchAppsParams {
            intent: Some("search the web".to_string()),
            include_functions: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(apps[0].name, "BRAVE_SEARCH");
    let functions = apps[0].functions.as_ref().unwrap();
    assert_eq!(functions[0].name, "BRAVE_SEARCH__WEB_SEARCH");

    // Step 2: inspect the app.
    let details = aci.get_app("BRAVE_SEARCH").unwrap();
    assert_eq!(details.display_name, "Brave Search");
    assert_eq!(details.functions.len(), 1);

    // Step 3: narrow down to functions of that app.
    let functions = aci
        .search_functions(&SearchFunctionsParams {
            app_names: Some(vec!["BRAVE_SEARCH".to_string()]),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].app_name(), "BRAVE_SEARCH");

    // Step 4: fetch its definition.
    let definition = aci.get_function_definition("BRAVE_SEARCH__WEB_SEARCH").unwrap();
    assert_eq!(definition["type"], "function");
    assert_eq!(definition["function"]["parameters"]["required"], json!(["query"]));

    // Step 5: execute it.
    let result = aci
        .execute_function("BRAVE_SEARCH__WEB_SEARCH", &json!({"query": "rust"}), SAMPLE_OWNER_ID)
        .unwrap();
    assert!(result.success);
    assert_eq!(result.data.unwrap()["input"]["query"], "rust");

    assert_eq!(state.hits("apps/search"), 1, "should not retry");
    assert_eq!(state.hits("functions/BRAVE_SEARCH__WEB_SEARCH/execute"), 1);
}

#[test]
fn pagination_and_filters_reach_the_server() {
    let (base_url, _state) = start_server();
    let aci = client(&base_url);

    let page = aci
        .search_apps(&SearchAppsParams {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        })
        .unwrap();
    let names: Vec<_> = page.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["GMAIL", "GITHUB"]);

    let allowed = aci
        .search_apps(&SearchAppsParams {
            allowed_apps_only: true,
            categories: Some(vec!["developer".to_string(), "email".to_string()]),
            ..Default::default()
        })
        .unwrap();
    let names: Vec<_> = allowed.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["GMAIL"]);

    let configured = aci
        .search_functions(&SearchFunctionsParams {
            configured_only: true,
            app_names: Some(vec!["GITHUB".to_string(), "GMAIL".to_string()]),
            ..Default::default()
        })
        .unwrap();
    assert!(configured.iter().all(|f| f.app_name() == "GMAIL"));
    assert_eq!(configured.len(), 2);
}

#[test]
fn anthropic_definitions() {
    let (base_url, _state) = start_server();
    let config = ClientConfig::new(MOCK_API_KEY)
        .with_base_url(&base_url)
        .with_inference_provider(InferenceProvider::Anthropic);
    let aci = Aci::new(config).unwrap();

    let definition = aci.get_function_definition("GMAIL__SEND_EMAIL").unwrap();
    assert_eq!(definition["name"], "GMAIL__SEND_EMAIL");
    assert!(definition["input_schema"]["properties"]["subject"].is_object());
    assert_eq!(
        aci.meta_function_schemas()[0]["name"],
        "ACI_SEARCH_APPS"
    );
}

#[test]
fn handle_function_call_routes_meta_and_direct_calls() {
    let (base_url, state) = start_server();
    let aci = client(&base_url);

    let apps = aci
        .handle_function_call("ACI_SEARCH_APPS", &json!({"intent": "email"}), SAMPLE_OWNER_ID)
        .unwrap();
    assert_eq!(apps[0]["name"], "GMAIL");

    let functions = aci
        .handle_function_call(
            "ACI_SEARCH_FUNCTIONS",
            &json!({"app_names": ["GITHUB"], "intent": "issue", "limit": null, "offset": null}),
            SAMPLE_OWNER_ID,
        )
        .unwrap();
    assert_eq!(functions, json!([{"name": "GITHUB__CREATE_ISSUE", "description": "Create an issue in a repository"}]));

    let definition = aci
        .handle_function_call(
            "ACI_GET_FUNCTION_DEFINITION",
            &json!({"function_name": "GMAIL__LIST_MESSAGES"}),
            SAMPLE_OWNER_ID,
        )
        .unwrap();
    assert_eq!(definition["function"]["name"], "GMAIL__LIST_MESSAGES");

    let executed = aci
        .handle_function_call(
            "ACI_EXECUTE_FUNCTION",
            &json!({
                "function_name": "GMAIL__SEND_EMAIL",
                "function_arguments": {"to": "a@b.c", "subject": "hi", "body": "hello"},
            }),
            SAMPLE_OWNER_ID,
        )
        .unwrap();
    assert_eq!(executed["success"], true);
    assert_eq!(executed["data"]["input"]["subject"], "hi");
    assert!(executed.get("error").is_none());

    // Tool calls usually carry their arguments as a JSON string.
    let direct = aci
        .handle_function_call(
            "BRAVE_SEARCH__WEB_SEARCH",
            &json!(r#"{"query": "test"}"#),
            SAMPLE_OWNER_ID,
        )
        .unwrap();
    assert_eq!(direct["data"]["function"], "BRAVE_SEARCH__WEB_SEARCH");
    assert_eq!(state.hits("functions/BRAVE_SEARCH__WEB_SEARCH/execute"), 1);
}

#[test]
fn wrong_api_key_is_an_authentication_error() {
    let (base_url, state) = start_server();
    let aci = client_with_key(&base_url, "wrong-key");

    let err = aci.search_functions(&SearchFunctionsParams::default()).unwrap_err();
    match err {
        Error::Api(ApiError::Authentication { status, message, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(state.hits("functions/search"), 1, "should not retry");
}

#[test]
fn missing_resources_are_not_found() {
    let (base_url, state) = start_server();
    let aci = client(&base_url);

    let err = aci.get_app("NOT_AN_APP").unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::NotFound { status: 404, .. })));
    assert_eq!(state.hits("apps/NOT_AN_APP"), 1, "should not retry");

    // GITHUB has no linked account for the sample owner.
    let err = aci
        .execute_function("GITHUB__STAR_REPOSITORY", &json!({"repo": "a/b"}), SAMPLE_OWNER_ID)
        .unwrap_err();
    assert!(err.to_string().contains("Linked account not found"));
}

#[test]
fn transient_failures_are_retried() {
    let (base_url, state) = start_server();
    let aci = client(&base_url);
    state.fail_next("apps/search", &[503, 429]);

    let apps = aci.search_apps(&SearchAppsParams::default()).unwrap();
    assert_eq!(apps.len(), 3);
    assert_eq!(state.hits("apps/search"), 3);
}

#[test]
fn retries_give_up_after_max_attempts() {
    let (base_url, state) = start_server();
    let aci = client(&base_url);
    state.fail_next("functions/GMAIL__LIST_MESSAGES/definition", &[500, 502, 504, 500]);

    let err = aci.get_function_definition("GMAIL__LIST_MESSAGES").unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Server { status: 504, .. })));
    assert_eq!(state.hits("functions/GMAIL__LIST_MESSAGES/definition"), 3);
}

#[test]
fn unexpected_status_is_retried_as_unknown() {
    let (base_url, state) = start_server();
    let aci = client(&base_url);
    state.fail_next("apps/GMAIL", &[418, 418, 418]);

    let err = aci.get_app("GMAIL").unwrap_err();
    match err {
        Error::Api(ApiError::Unknown { status, message, .. }) => {
            assert_eq!(status, 418);
            assert_eq!(message, "Unexpected error occurred. Status code: 418");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(state.hits("apps/GMAIL"), 3);
}

#[test]
fn validation_errors_are_not_retried() {
    let (base_url, state) = start_server();
    let aci = client(&base_url);
    state.fail_next("apps/search", &[400]);

    let err = aci.search_apps(&SearchAppsParams::default()).unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Validation { .. })));
    assert_eq!(state.hits("apps/search"), 1);
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let aci = client(&format!("http://{addr}/v1"));
    let err = aci.get_app("GMAIL").unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err}");
    assert!(err.is_retryable());
}
