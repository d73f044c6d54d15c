//! The central Model Context Protocol engine
//!
//! Provides JSON-RPC decoding, method routing, capabilities negotiation
//! (`initialize`), and the bridge from `tools/call` into the tool dispatcher.

use rust_mcp_sdk::schema::{
    CallToolRequest, CallToolRequestParams, CallToolResult, ContentBlock, Implementation,
    InitializeRequest, InitializeResult, JsonrpcMessage, JsonrpcRequest, ListToolsRequest,
    ListToolsResult, PingRequest, ServerCapabilities, ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::info;

use crate::domain::{content::Content, dispatcher::InvocationRequest};
use crate::mcp::rpc::{
    app_error_to_json_rpc, invocation_error_to_json_rpc, is_json_rpc_error, json_rpc_error,
    json_rpc_result, request_id_to_value, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};
use crate::{
    errors::{AppError, InvocationError},
    AppState,
};

pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = [LATEST_PROTOCOL_VERSION, "2025-03-26", "2024-11-05"];

pub async fn handle_json_rpc_value(state: &AppState, identity: &str, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(Some(request_id), INVALID_REQUEST, "Invalid Request"));
            }

            Some(
                handle_json_rpc_request(
                    state,
                    identity,
                    Some(request_id),
                    request.method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            if notification.method.trim().is_empty() {
                return None;
            }

            let _ = handle_json_rpc_request(
                state,
                identity,
                None,
                notification.method,
                notification.params.map(Value::Object),
            )
            .await;
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
        }
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let request_id = Some(request_id_to_value(request.id.clone()));
    let payload = match serde_json::to_value(request) {
        Ok(payload) => payload,
        Err(_) => return Err(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    identity: &str,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let tool = params
        .as_ref()
        .filter(|_| method == "tools/call")
        .and_then(|params| params.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let response = match method.as_str() {
        "initialize" => match initialize_result(params.as_ref()) {
            Ok(result) => json_rpc_result(id, result),
            Err(err) => app_error_to_json_rpc(id, err),
        },
        "ping" | "notifications/initialized" => json_rpc_result(id, json!({})),
        "tools/list" => match tools_list_result(state) {
            Ok(result) => json_rpc_result(id, result),
            Err(err) => app_error_to_json_rpc(id, err),
        },
        "tools/call" => handle_tools_call(state, identity, id, params).await,
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    info!(
        method = %method,
        tool = tool.as_deref().unwrap_or("-"),
        client = %identity,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

fn initialize_result(params: Option<&Value>) -> Result<Value, AppError> {
    let protocol_version = negotiate_protocol_version(params)?;

    let initialize_result = InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: None,
            prompts: None,
            ..Default::default()
        },
        protocol_version: protocol_version.to_string(),
        instructions: Some("Call the `add` tool with integer arguments `x` and `y`.".to_string()),
        meta: None,
    };

    serde_json::to_value(initialize_result)
        .map_err(|err| AppError::internal(format!("initialize result serialization: {err}")))
}

fn tools_list_result(state: &AppState) -> Result<Value, AppError> {
    let tools = state
        .dispatcher
        .registry()
        .descriptors()
        .map(|descriptor| descriptor.to_tool())
        .collect::<Result<Vec<_>, _>>()?;

    serde_json::to_value(ListToolsResult {
        meta: None,
        next_cursor: None,
        tools,
    })
    .map_err(|err| AppError::internal(format!("tools list result serialization: {err}")))
}

pub async fn handle_tools_call(
    state: &AppState,
    identity: &str,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let request = InvocationRequest::new(tool_call.name, tool_call.arguments.map(Value::Object));
    let outcome = state.dispatcher.invoke_as(identity, request).await;

    let call_result = match outcome {
        Ok(content) => tool_result(&content, false),
        Err(InvocationError::HandlerError { message }) => {
            tool_result(&[Content::text(message)], true)
        }
        Err(err) => return invocation_error_to_json_rpc(id, &err),
    };

    match call_result.and_then(|result| {
        serde_json::to_value(result)
            .map_err(|err| AppError::internal(format!("tool result serialization: {err}")))
    }) {
        Ok(result) => json_rpc_result(id, result),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

fn tool_result(content: &[Content], is_error: bool) -> Result<CallToolResult, AppError> {
    let content = content
        .iter()
        .map(Content::to_content_block)
        .collect::<Result<Vec<ContentBlock>, _>>()?;

    Ok(CallToolResult {
        content,
        is_error: is_error.then_some(true),
        meta: None,
        structured_content: None,
    })
}

/// Echoes a supported offered version, otherwise answers with the latest one.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|version| *version == offered_version)
        .unwrap_or(LATEST_PROTOCOL_VERSION))
}
