//! Axum HTTP handlers for the web server
//!
//! Provides the primary Model Context Protocol endpoint, and general metadata endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::http::identity::{ClientIdentity, SESSION_ID_HEADER};
use crate::mcp::rpc::{is_json_rpc_error, json_rpc_error, INVALID_REQUEST, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_value;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
    })
}

pub async fn mcp_endpoint(
    State(state): State<AppState>,
    Extension(identity): Extension<ClientIdentity>,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(json_rpc_error(None, PARSE_ERROR, "Parse error")),
            )
                .into_response()
        }
    };

    if let Some(batch) = payload.as_array() {
        if batch.is_empty() {
            return (
                StatusCode::OK,
                Json(vec![json_rpc_error(None, INVALID_REQUEST, "Invalid Request")]),
            )
                .into_response();
        }

        let mut responses = Vec::new();
        for item in batch {
            if let Some(response) = handle_json_rpc_value(&state, identity.key(), item.clone()).await {
                responses.push(response);
            }
        }

        if responses.is_empty() {
            return StatusCode::NO_CONTENT.into_response();
        }

        return (StatusCode::OK, Json(Value::Array(responses))).into_response();
    }

    // A client that initializes without a session id gets one minted for it.
    let issued_session = (is_initialize(&payload) && !identity.has_session_id())
        .then(|| Uuid::new_v4().to_string());
    let identity = match &issued_session {
        Some(session_id) => ClientIdentity::Session(session_id.clone()),
        None => identity,
    };

    let Some(body) = handle_json_rpc_value(&state, identity.key(), payload).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    // a failed initialize leaves the client without a session
    let issued_session = issued_session.filter(|_| !is_json_rpc_error(&body));
    let mut response = (StatusCode::OK, Json(body)).into_response();

    if let Some(value) = issued_session.and_then(|id| HeaderValue::from_str(&id).ok()) {
        info!(session_id = ?value, "issued mcp session id");
        response.headers_mut().insert(SESSION_ID_HEADER, value);
    }

    response
}

fn is_initialize(payload: &Value) -> bool {
    payload.get("method").and_then(Value::as_str) == Some("initialize")
}
