//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps application and tool invocation errors onto JSON-RPC payloads.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::{AppError, InvocationError};

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::Unauthorized { code, message } => json_rpc_error_with_data(
            id,
            -32001,
            "Unauthorized",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::Internal { message, .. } => {
            tracing::error!(error = %message, "mcp request failed with internal error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

/// Dispatch-time failures that are protocol errors. Handler failures are not
/// routed here; they travel inside a `CallToolResult` flagged `isError`.
pub fn invocation_error_to_json_rpc(id: Option<Value>, err: &InvocationError) -> Value {
    let (code, message, details) = match err {
        InvocationError::MissingArguments => (INVALID_PARAMS, "Invalid params", json!({})),
        InvocationError::UnknownTool { name } => {
            (METHOD_NOT_FOUND, "Method not found", json!({ "name": name }))
        }
        InvocationError::InvalidArguments { field, .. } => {
            (INVALID_PARAMS, "Invalid params", json!({ "field": field }))
        }
        InvocationError::HandlerError { .. } => (INTERNAL_ERROR, "Internal error", json!({})),
    };

    json_rpc_error_with_data(
        id,
        code,
        message,
        Some(json!({
            "code": err.kind(),
            "message": err.to_string(),
            "details": details,
        })),
    )
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{invocation_error_to_json_rpc, json_rpc_result, value_to_request_id};
    use crate::errors::InvocationError;

    #[test]
    fn unknown_tool_maps_to_method_not_found_with_tool_name() {
        let response = invocation_error_to_json_rpc(
            Some(json!(7)),
            &InvocationError::UnknownTool {
                name: "mul".to_string(),
            },
        );

        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["data"]["code"], "tool_not_found");
        assert_eq!(response["error"]["data"]["details"]["name"], "mul");
    }

    #[test]
    fn invalid_arguments_maps_to_invalid_params_with_field() {
        let response = invocation_error_to_json_rpc(
            Some(json!("req-1")),
            &InvocationError::invalid_arguments(Some("y"), "missing required field `y`"),
        );

        assert_eq!(response["id"], "req-1");
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["data"]["code"], "invalid_arguments");
        assert_eq!(response["error"]["data"]["details"]["field"], "y");
    }

    #[test]
    fn request_ids_accept_strings_and_integers_only() {
        assert!(value_to_request_id(&json!(1)).is_some());
        assert!(value_to_request_id(&json!("a")).is_some());
        assert!(value_to_request_id(&json!(1.5)).is_none());
        assert!(value_to_request_id(&json!(null)).is_none());
    }

    #[test]
    fn result_without_id_keeps_raw_shape() {
        let response = json_rpc_result(None, json!({"ok": true}));
        assert_eq!(response["jsonrpc"], "2.0");
        assert!(response["id"].is_null());
        assert_eq!(response["result"]["ok"], true);
    }
}
