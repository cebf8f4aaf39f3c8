use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, MockState, MOCK_API_KEY, SAMPLE_OWNER_ID};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", MOCK_API_KEY)
        .body(String::new())
        .unwrap()
}

fn execute_request(function: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(format!("/v1/functions/{function}/execute"))
        .header("x-api-key", MOCK_API_KEY)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn names(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect()
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/apps/search").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Missing API key");
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/functions/search")
                .header("x-api-key", "nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- apps ---

#[tokio::test]
async fn search_apps_returns_all_without_filters() {
    let resp = app().oneshot(get_request("/v1/apps/search")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(names(&body), vec!["BRAVE_SEARCH", "GMAIL", "GITHUB"]);
    assert!(body[0].get("functions").is_none());
}

#[tokio::test]
async fn search_apps_ranks_by_intent() {
    let resp = app()
        .oneshot(get_request("/v1/apps/search?intent=send%20emails"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(names(&body), vec!["GMAIL"]);
}

#[tokio::test]
async fn search_apps_filters_allowed_and_categories() {
    let resp = app()
        .oneshot(get_request("/v1/apps/search?allowed_apps_only=true"))
        .await
        .unwrap();
    assert_eq!(names(&body_json(resp).await), vec!["BRAVE_SEARCH", "GMAIL"]);

    let resp = app()
        .oneshot(get_request("/v1/apps/search?categories=developer&categories=search"))
        .await
        .unwrap();
    assert_eq!(names(&body_json(resp).await), vec!["BRAVE_SEARCH", "GITHUB"]);
}

#[tokio::test]
async fn search_apps_includes_functions_and_pages() {
    let resp = app()
        .oneshot(get_request("/v1/apps/search?include_functions=true&limit=1&offset=1"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(names(&body), vec!["GMAIL"]);
    assert_eq!(
        names(&body[0]["functions"]),
        vec!["GMAIL__SEND_EMAIL", "GMAIL__LIST_MESSAGES"]
    );
}

#[tokio::test]
async fn search_apps_rejects_bad_limit() {
    let resp = app().oneshot(get_request("/v1/apps/search?limit=0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app().oneshot(get_request("/v1/apps/search?limit=5000")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn get_app_returns_details() {
    let resp = app().oneshot(get_request("/v1/apps/GITHUB")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["display_name"], "GitHub");
    assert_eq!(body["functions"].as_array().unwrap().len(), 2);
    assert!(body["logo"].is_null());
}

#[tokio::test]
async fn get_app_unknown_returns_404() {
    let resp = app().oneshot(get_request("/v1/apps/NOPE")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- functions ---

#[tokio::test]
async fn search_functions_by_app_names() {
    let resp = app()
        .oneshot(get_request("/v1/functions/search?app_names=GITHUB"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(
        names(&body),
        vec!["GITHUB__CREATE_ISSUE", "GITHUB__STAR_REPOSITORY"]
    );
}

#[tokio::test]
async fn search_functions_configured_only() {
    let resp = app()
        .oneshot(get_request("/v1/functions/search?configured_only=true&intent=star"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert!(names(&body).is_empty());
}

#[tokio::test]
async fn definition_in_both_formats() {
    let resp = app()
        .oneshot(get_request(
            "/v1/functions/BRAVE_SEARCH__WEB_SEARCH/definition?inference_provider=openai",
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["type"], "function");
    assert_eq!(body["function"]["name"], "BRAVE_SEARCH__WEB_SEARCH");

    let resp = app()
        .oneshot(get_request(
            "/v1/functions/BRAVE_SEARCH__WEB_SEARCH/definition?inference_provider=anthropic",
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["input_schema"]["required"], json!(["query"]));
}

#[tokio::test]
async fn definition_requires_provider() {
    let resp = app()
        .oneshot(get_request("/v1/functions/BRAVE_SEARCH__WEB_SEARCH/definition"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn execute_echoes_input() {
    let body = json!({
        "function_input": {"query": "rust"},
        "linked_account_owner_id": SAMPLE_OWNER_ID,
    })
    .to_string();
    let resp = app()
        .oneshot(execute_request("BRAVE_SEARCH__WEB_SEARCH", &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["input"]["query"], "rust");
}

#[tokio::test]
async fn execute_without_linked_account_returns_404() {
    let body = json!({
        "function_input": {"repo": "x/y"},
        "linked_account_owner_id": SAMPLE_OWNER_ID,
    })
    .to_string();
    let resp = app()
        .oneshot(execute_request("GITHUB__STAR_REPOSITORY", &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("Linked account"));
}

#[tokio::test]
async fn execute_malformed_body_returns_400() {
    let resp = app()
        .oneshot(execute_request("BRAVE_SEARCH__WEB_SEARCH", r#"{"function_input":{}}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- fault injection ---

#[tokio::test]
async fn injected_faults_precede_normal_responses() {
    let state = MockState::default();
    state.fail_next("apps/GMAIL", &[503]);

    let resp = router(state.clone())
        .oneshot(get_request("/v1/apps/GMAIL"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body_bytes(resp).await.is_empty());

    let resp = router(state.clone())
        .oneshot(get_request("/v1/apps/GMAIL"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.hits("apps/GMAIL"), 2);
}
