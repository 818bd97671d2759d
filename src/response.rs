use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

/// Envelope wrapped around every response body.
///
/// Successful responses carry `data`, failures carry `error`; the other
/// field is omitted from the JSON.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    code: StatusCode,
    pub status: Outcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::CREATED, message, data)
    }

    fn success(code: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            status: Outcome::Success,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::OK,
            status: Outcome::Success,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure(code: StatusCode, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code,
            status: Outcome::Error,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
