//! Integration tests for the streamable HTTP transport.

mod fixtures;
mod mocks;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use fixtures::{tools_with, uniswap_entries, UNISWAP_URL};
use metadata_mcp_server::error::codes;
use metadata_mcp_server::server::http::SESSION_HEADER;
use metadata_mcp_server::server::{router, AppState};
use metadata_mcp_server::{Metrics, SessionRegistry};
use mocks::MockMetadataClient;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

const TOKEN: &str = "test-token";

fn state_with(mock: &MockMetadataClient) -> AppState {
    let metrics = Metrics::new();
    AppState::new(
        tools_with(mock),
        SessionRegistry::new(Duration::from_secs(30 * 60), metrics.clone()),
        Some(TOKEN.to_string()),
        metrics,
    )
}

fn post(body: Value, session_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(sid) = session_id {
        builder = builder.header(SESSION_HEADER, sid);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(state: &AppState, request: Request<Body>) -> Response {
    router(state.clone()).oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn initialize(state: &AppState) -> String {
    let response = send(
        state,
        post(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }
            }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(SESSION_HEADER)
        .expect("session header")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_initialize_mints_session() {
    let state = state_with(&MockMetadataClient::new());

    let response = send(
        &state,
        post(
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05"}}),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let session_id = response.headers().get(SESSION_HEADER).unwrap().to_str().unwrap().to_string();
    assert_eq!(session_id.len(), 36);

    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(body["result"]["serverInfo"]["name"], "metadata-mcp-server");
    assert_eq!(state.sessions.count(), 1);
    assert!(state.sessions.lookup(&session_id).is_some());
}

#[tokio::test]
async fn test_initialize_with_session_header_rejected() {
    let state = state_with(&MockMetadataClient::new());
    let session_id = initialize(&state).await;

    let response = send(
        &state,
        post(json!({"jsonrpc": "2.0", "id": 2, "method": "initialize"}), Some(&session_id)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], codes::INVALID_SESSION);
    assert_eq!(state.sessions.count(), 1);
}

#[tokio::test]
async fn test_request_without_session_rejected() {
    let state = state_with(&MockMetadataClient::new());

    let response = send(&state, post(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}), None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], codes::INVALID_SESSION);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let state = state_with(&MockMetadataClient::new());

    let response = send(
        &state,
        post(json!({"jsonrpc": "2.0", "id": 9, "method": "ping"}), Some("no-such-session")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["id"], 9);
    assert_eq!(body["error"]["code"], codes::INVALID_SESSION);
}

#[tokio::test]
async fn test_missing_bearer_token_unauthorized() {
    let state = state_with(&MockMetadataClient::new());

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::from(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}).to_string()))
        .unwrap();
    let response = send(&state, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], codes::UNAUTHORIZED);
    assert_eq!(state.sessions.count(), 0);
}

#[tokio::test]
async fn test_lowercase_bearer_scheme_accepted() {
    let state = state_with(&MockMetadataClient::new());

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}).to_string()))
        .unwrap();
    let response = send(&state, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SESSION_HEADER).is_some());
    assert_eq!(state.sessions.count(), 1);
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let state = state_with(&MockMetadataClient::new());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = send(&state, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_tools_list_and_ping() {
    let state = state_with(&MockMetadataClient::new());
    let session_id = initialize(&state).await;

    let response = send(
        &state,
        post(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}), Some(&session_id)),
    )
    .await;
    assert_eq!(response.headers().get(SESSION_HEADER).unwrap(), session_id.as_str());
    let body = body_json(response).await;
    let names: Vec<&str> = body["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["getProtocolTokens", "getMiniAppEndpoints", "getMetadataOfTemplate"]
    );
    assert!(body["result"]["tools"][0]["inputSchema"].is_object());

    let response = send(
        &state,
        post(json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}), Some(&session_id)),
    )
    .await;
    assert_eq!(body_json(response).await["result"], json!({}));
}

#[tokio::test]
async fn test_tools_call_success_and_error_codes() {
    let mock = MockMetadataClient::new();
    mock.set_token_list(UNISWAP_URL, uniswap_entries());
    let state = state_with(&mock);
    let session_id = initialize(&state).await;

    let response = send(
        &state,
        post(
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "getProtocolTokens", "arguments": {"protocol": "uniswap", "chainId": 1}}
            }),
            Some(&session_id),
        ),
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["result"]["isError"], false);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["total"], 2);

    let response = send(
        &state,
        post(
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {"name": "getProtocolTokens", "arguments": {"protocol": "uniswap", "chainId": "unknownchain"}}
            }),
            Some(&session_id),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 5);
    assert_eq!(body["error"]["code"], codes::UNKNOWN_CHAIN);
    assert_eq!(body["error"]["data"]["kind"], "unknown_chain");

    let response = send(
        &state,
        post(
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {"name": "nope"}}),
            Some(&session_id),
        ),
    )
    .await;
    assert_eq!(body_json(response).await["error"]["code"], codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_unknown_method_notification_and_batch() {
    let state = state_with(&MockMetadataClient::new());
    let session_id = initialize(&state).await;

    let response = send(
        &state,
        post(json!({"jsonrpc": "2.0", "id": 7, "method": "resources/list"}), Some(&session_id)),
    )
    .await;
    assert_eq!(body_json(response).await["error"]["code"], codes::METHOD_NOT_FOUND);

    let response = send(
        &state,
        post(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            Some(&session_id),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = send(
        &state,
        post(json!([{"jsonrpc": "2.0", "id": 8, "method": "ping"}]), Some(&session_id)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], codes::INVALID_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let state = state_with(&MockMetadataClient::new());

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&state, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], codes::PARSE_ERROR);
}

#[tokio::test]
async fn test_delete_closes_session_and_event_stream() {
    let state = state_with(&MockMetadataClient::new());
    let session_id = initialize(&state).await;

    let request = Request::builder()
        .method("GET")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(SESSION_HEADER, &session_id)
        .body(Body::empty())
        .unwrap();
    let stream = send(&state, request).await;
    assert_eq!(stream.status(), StatusCode::OK);
    assert_eq!(
        stream.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/mcp")
            .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
            .header(SESSION_HEADER, &session_id)
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(&state, delete()).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(send(&state, delete()).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.sessions.count(), 0);

    // The event stream ends once its session is closed
    let drained = tokio::time::timeout(
        Duration::from_secs(5),
        axum::body::to_bytes(stream.into_body(), usize::MAX),
    )
    .await;
    assert!(drained.is_ok());

    let response = send(
        &state,
        post(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}), Some(&session_id)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_idle_session_expires() {
    let state = state_with(&MockMetadataClient::new());
    let session_id = initialize(&state).await;

    tokio::time::sleep(Duration::from_secs(30 * 60 + 1)).await;

    let response = send(
        &state,
        post(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}), Some(&session_id)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.metrics.sessions_expired_total(), 1);
}
