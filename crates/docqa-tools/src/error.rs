use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use docqa_core::Error;

/// Error body: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn not_found() -> Self { Self { status: StatusCode::NOT_FOUND, code: "NOT_FOUND", message: "Not found".into() } }

    pub fn status(&self) -> StatusCode { self.status }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "INVALID_PARAMETER"),
            Error::ToolNotFound(_) => (StatusCode::NOT_FOUND, "TOOL_NOT_FOUND"),
            Error::ToolNotReady(_) => (StatusCode::SERVICE_UNAVAILABLE, "TOOL_NOT_READY"),
            Error::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let message = match err {
            Error::InvalidParameter(_) | Error::ToolNotFound(_) | Error::ToolNotReady(_) | Error::NotReady => err.to_string(),
            other => format!("Tool invocation failed: {other}"),
        };
        Self { status, code, message }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code: "BAD_REQUEST", message: rejection.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: ErrorDetail { code: self.code.to_string(), message: self.message } };
        (self.status, Json(body)).into_response()
    }
}
