//! Streamable HTTP transport: JSON-RPC over `POST /mcp` with bearer auth.
//!
//! Sessions are minted on `initialize` and tracked in the [`SessionRegistry`].
//! Every later request must carry the `Mcp-Session-Id` header; a successful
//! lookup slides the session's inactivity deadline. `GET /mcp` opens an SSE
//! stream that ends when the session is closed, evicted, or the server shuts
//! down.

use crate::error::codes;
use crate::metrics::Metrics;
use crate::server::handlers::{SERVER_INSTRUCTIONS, SERVER_NAME};
use crate::server::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::session::{ConnectionHandle, SessionRegistry};
use crate::tools::MetadataTools;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::{FutureExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use subtle::ConstantTimeEq;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const MCP_PATH: &str = "/mcp";
pub const HEALTH_PATH: &str = "/health";
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Protocol versions this server speaks, newest last.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Echo the client's version when supported, otherwise offer the latest.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|requested| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .find(|supported| **supported == requested)
                .copied()
        })
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// Connection handle stored in the registry for one HTTP session.
#[derive(Debug)]
pub struct McpSession {
    pub id: String,
    pub protocol_version: String,
    pub client_name: Option<String>,
    pub created_at: DateTime<Utc>,
    closed: CancellationToken,
}

impl McpSession {
    pub fn new(id: String, protocol_version: String, client_name: Option<String>) -> Self {
        Self {
            id,
            protocol_version,
            client_name,
            created_at: Utc::now(),
            closed: CancellationToken::new(),
        }
    }

    /// Token cancelled when the session is closed.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl ConnectionHandle for McpSession {
    fn close(&self) {
        tracing::debug!(session_id = %self.id, "Closing session");
        self.closed.cancel();
    }
}

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub tools: MetadataTools,
    pub sessions: SessionRegistry<McpSession>,
    auth_token: Option<Arc<str>>,
    pub metrics: Metrics,
    started: Instant,
}

impl AppState {
    /// Create handler state.
    ///
    /// # Arguments
    /// * `tools` - Shared tool set
    /// * `sessions` - Registry of live sessions
    /// * `auth_token` - Required bearer token; `None` disables the check
    /// * `metrics` - Shared metrics collector
    pub fn new(
        tools: MetadataTools,
        sessions: SessionRegistry<McpSession>,
        auth_token: Option<String>,
        metrics: Metrics,
    ) -> Self {
        Self {
            tools,
            sessions,
            auth_token: auth_token.map(Arc::from),
            metrics,
            started: Instant::now(),
        }
    }
}

/// Build the router: `/mcp` behind bearer auth, `/health` open.
pub fn router(state: AppState) -> Router {
    let mcp = Router::new()
        .route(
            MCP_PATH,
            post(handle_post).get(handle_get).delete(handle_delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .merge(mcp)
        .route(HEALTH_PATH, get(health))
        .with_state(state)
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(|presented| presented.as_bytes().ct_eq(expected.as_bytes()).into())
        .unwrap_or(false);

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!("Rejected request with missing or invalid bearer token");
    state.metrics.record_rpc_request(true);
    let mut response = rpc_response(
        StatusCode::UNAUTHORIZED,
        JsonRpcResponse::err(
            Value::Null,
            JsonRpcError::new(codes::UNAUTHORIZED, "Unauthorized"),
        ),
        None,
    );
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

/// Credentials of an `Authorization` value whose scheme is `Bearer`, in any case.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

async fn handle_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let started = Instant::now();
    let response = dispatch_post(&state, &headers, &body).await;

    state
        .metrics
        .record_rpc_request(!response.status().is_success());
    tracing::debug!(status = %response.status(), elapsed = ?started.elapsed(), "POST /mcp");
    response
}

async fn dispatch_post(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Response {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return bad_request(
                JsonRpcError::new(codes::PARSE_ERROR, "Parse error")
                    .with_data(serde_json::json!({ "detail": e.to_string() })),
            );
        }
    };

    if value.is_array() {
        return bad_request(JsonRpcError::new(
            codes::INVALID_REQUEST,
            "Batch requests are not supported",
        ));
    }

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return bad_request(
                JsonRpcError::new(codes::INVALID_REQUEST, "Invalid request")
                    .with_data(serde_json::json!({ "detail": e.to_string() })),
            );
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return bad_request(JsonRpcError::new(
            codes::INVALID_REQUEST,
            "jsonrpc must be \"2.0\"",
        ));
    }

    let session_id = header_str(headers, SESSION_HEADER);

    if request.method == "initialize" {
        if session_id.is_some() {
            return bad_request(JsonRpcError::invalid_session(
                "initialize must not carry an Mcp-Session-Id header",
            ));
        }
        if request.is_notification() {
            return bad_request(JsonRpcError::new(
                codes::INVALID_REQUEST,
                "initialize must be a request with an id",
            ));
        }
        return initialize(state, request);
    }

    let Some(session_id) = session_id else {
        return bad_request(JsonRpcError::invalid_session(
            "Missing Mcp-Session-Id header",
        ));
    };

    let Some(session) = state.sessions.lookup(session_id) else {
        tracing::debug!(session_id = %session_id, "Unknown or expired session");
        return rpc_response(
            StatusCode::NOT_FOUND,
            JsonRpcResponse::err(
                request.response_id(),
                JsonRpcError::invalid_session("Session not found or expired"),
            ),
            None,
        );
    };

    if request.is_notification() {
        tracing::debug!(session_id = %session.id, method = %request.method, "Notification received");
        return StatusCode::ACCEPTED.into_response();
    }

    let id = request.response_id();
    let method = request.method.clone();
    let outcome = AssertUnwindSafe(handle_method(state, request))
        .catch_unwind()
        .await;

    let body = match outcome {
        Ok(Ok(result)) => JsonRpcResponse::ok(id, result),
        Ok(Err(error)) => JsonRpcResponse::err(id, error),
        Err(_) => {
            tracing::error!(method = %method, session_id = %session.id, "Handler panicked");
            JsonRpcResponse::err(id, JsonRpcError::internal())
        }
    };
    rpc_response(StatusCode::OK, body, Some(&session.id))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: Option<String>,
    #[serde(default)]
    client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
struct ClientInfo {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

fn initialize(state: &AppState, request: JsonRpcRequest) -> Response {
    let id = request.response_id();
    let params: InitializeParams = if request.params.is_null() {
        InitializeParams::default()
    } else {
        match serde_json::from_value(request.params) {
            Ok(params) => params,
            Err(e) => {
                return bad_request(JsonRpcError::new(
                    codes::INVALID_PARAMS,
                    format!("Invalid initialize params: {}", e),
                ));
            }
        }
    };

    let protocol_version = negotiate_protocol_version(params.protocol_version.as_deref());
    let session_id = Uuid::new_v4().to_string();
    let client_name = params.client_info.as_ref().map(|info| info.name.clone());

    tracing::info!(
        session_id = %session_id,
        client = ?client_name,
        client_version = ?params.client_info.as_ref().and_then(|info| info.version.as_deref()),
        protocol_version,
        "Session initialized"
    );

    state.sessions.create(
        session_id.clone(),
        Arc::new(McpSession::new(
            session_id.clone(),
            protocol_version.to_string(),
            client_name,
        )),
    );

    let result = serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "instructions": SERVER_INSTRUCTIONS,
    });
    rpc_response(
        StatusCode::OK,
        JsonRpcResponse::ok(id, result),
        Some(&session_id),
    )
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn handle_method(state: &AppState, request: JsonRpcRequest) -> Result<Value, JsonRpcError> {
    match request.method.as_str() {
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => Ok(serde_json::json!({ "tools": MetadataTools::definitions() })),
        "tools/call" => {
            let params: CallToolParams = serde_json::from_value(request.params).map_err(|e| {
                JsonRpcError::new(codes::INVALID_PARAMS, format!("Invalid tools/call params: {}", e))
            })?;
            tracing::info!(tool = %params.name, "tools/call");

            match state.tools.call(&params.name, params.arguments).await {
                Ok(Some(output)) => Ok(serde_json::json!({
                    "content": [{ "type": "text", "text": output.into_text() }],
                    "isError": false,
                })),
                Ok(None) => Err(JsonRpcError::new(
                    codes::INVALID_PARAMS,
                    format!("Unknown tool: {}", params.name),
                )),
                Err(e) => {
                    tracing::warn!(tool = %params.name, error = %e, "Tool call failed");
                    Err(JsonRpcError::from(&e))
                }
            }
        }
        other => Err(JsonRpcError::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    }
}

async fn handle_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session_id) = header_str(&headers, SESSION_HEADER) else {
        return bad_request(JsonRpcError::invalid_session(
            "Missing Mcp-Session-Id header",
        ));
    };
    let Some(session) = state.sessions.lookup(session_id) else {
        return rpc_response(
            StatusCode::NOT_FOUND,
            JsonRpcResponse::err(
                Value::Null,
                JsonRpcError::invalid_session("Session not found or expired"),
            ),
            None,
        );
    };

    tracing::debug!(session_id = %session.id, "Opening event stream");
    let closed = session.closed_token();
    // Nothing is pushed server-side; the stream only lives as long as the session.
    let stream = futures::stream::once(async move { closed.cancelled_owned().await })
        .filter_map(|_| async { None::<Result<Event, Infallible>> });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session_id) = header_str(&headers, SESSION_HEADER) else {
        return bad_request(JsonRpcError::invalid_session(
            "Missing Mcp-Session-Id header",
        ));
    };

    if state.sessions.remove(session_id) {
        tracing::info!(session_id = %session_id, "Session closed by client");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.started.elapsed().as_secs(),
        "sessions": state.sessions.count(),
        "repositoryCached": state.tools.repository().is_fresh(),
        "tokenListsCached": state.tools.tokens().len(),
        "metrics": state.metrics.summary(),
    }))
}

fn bad_request(error: JsonRpcError) -> Response {
    rpc_response(
        StatusCode::BAD_REQUEST,
        JsonRpcResponse::err(Value::Null, error),
        None,
    )
}

fn rpc_response(status: StatusCode, body: JsonRpcResponse, session_id: Option<&str>) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Some(value) = session_id.and_then(|sid| HeaderValue::from_str(sid).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_protocol_version() {
        assert_eq!(negotiate_protocol_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(
            negotiate_protocol_version(Some("1999-01-01")),
            LATEST_PROTOCOL_VERSION
        );
        assert_eq!(negotiate_protocol_version(None), LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn test_session_close_cancels_token() {
        let session = McpSession::new("abc".to_string(), "2025-06-18".to_string(), None);
        let token = session.closed_token();
        assert!(!session.is_closed());

        session.close();
        assert!(session.is_closed());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER   abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearerabc"), None);
    }

    #[test]
    fn test_header_str_ignores_blank() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("  "));
        assert_eq!(header_str(&headers, SESSION_HEADER), None);

        headers.insert(SESSION_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(header_str(&headers, SESSION_HEADER), Some("abc"));
    }
}
