use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: &'static str,
    },
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: &'static str) -> Self {
        Self::BadRequest { code, message }
    }

    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, code, message.to_string())
            }
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message.to_string())
            }
            Self::Internal { code, message } => {
                tracing::error!(error = %message, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
                details: json!({}),
            }),
        )
            .into_response()
    }
}

/// Raised while populating the tool registry at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    DuplicateName(String),
}

/// Every way a tool invocation can fail. Returned as a value from the
/// dispatcher, never raised past it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("no arguments provided")]
    MissingArguments,
    #[error("unknown tool `{name}`")]
    UnknownTool { name: String },
    #[error("invalid arguments: {detail}")]
    InvalidArguments {
        field: Option<String>,
        detail: String,
    },
    #[error("tool failed: {message}")]
    HandlerError { message: String },
}

impl InvocationError {
    pub fn invalid_arguments(field: Option<&str>, detail: impl Into<String>) -> Self {
        Self::InvalidArguments {
            field: field.map(str::to_string),
            detail: detail.into(),
        }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::HandlerError {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingArguments => "missing_arguments",
            Self::UnknownTool { .. } => "tool_not_found",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::HandlerError { .. } => "handler_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InvocationError;

    #[test]
    fn invocation_error_kinds_are_stable() {
        assert_eq!(InvocationError::MissingArguments.kind(), "missing_arguments");
        assert_eq!(
            InvocationError::UnknownTool {
                name: "mul".to_string()
            }
            .kind(),
            "tool_not_found"
        );
        assert_eq!(
            InvocationError::invalid_arguments(Some("x"), "expected integer").kind(),
            "invalid_arguments"
        );
        assert_eq!(InvocationError::handler("boom").kind(), "handler_error");
    }

    #[test]
    fn handler_error_message_is_preserved() {
        let error = InvocationError::handler("divide by zero");
        assert_eq!(error.to_string(), "tool failed: divide by zero");
    }
}
