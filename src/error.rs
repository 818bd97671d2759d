use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{db::StoreError, response::ApiResponse};

const INTERNAL_TITLE: &str = "Internal Server Error";
const INTERNAL_DETAIL: &str = "Internal server error";

/// Failure type shared by every service and handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation Error",
            AppError::Auth(_) => "Authentication Error",
            AppError::Conflict(_) => "Conflict",
            AppError::NotFound(_) => "Not Found",
            AppError::Internal(_) => INTERNAL_TITLE,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AppError::Conflict("Resource already exists".into()),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e).context("database")),
        }
    }
}

/// Full error chain of a 500, attached to the response so a non-production
/// layer can expose it.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let title = self.title();

        match self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                let mut res = ApiResponse::failure(code, title, INTERNAL_DETAIL).into_response();
                res.extensions_mut().insert(InternalDetail(format!("{e:#}")));
                res
            }
            other => ApiResponse::failure(code, title, other.to_string()).into_response(),
        }
    }
}

/// Rewrites 500 bodies to carry the full error chain. Only layered outside production.
pub async fn expose_internal_detail(res: Response) -> Response {
    match res.extensions().get::<InternalDetail>().cloned() {
        Some(InternalDetail(detail)) => {
            ApiResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_TITLE, detail)
                .into_response()
        }
        None => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn variants_map_to_status_codes() {
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::auth("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: AppError = StoreError::Conflict.into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn client_errors_echo_their_message() {
        let res = AppError::validation("Title is required").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = body_json(res).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Validation Error");
        assert_eq!(body["error"], "Title is required");
    }

    #[tokio::test]
    async fn internal_errors_hide_detail_by_default() {
        let err = AppError::Internal(anyhow::anyhow!("relation \"todos\" does not exist"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(res).await;
        assert_eq!(body["error"], INTERNAL_DETAIL);
    }

    #[tokio::test]
    async fn exposing_layer_reveals_the_error_chain() {
        let err = anyhow::anyhow!("connection refused").context("load todo");
        let res = expose_internal_detail(AppError::Internal(err).into_response()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(res).await;
        assert_eq!(body["message"], "Internal Server Error");
        assert_eq!(body["error"], "load todo: connection refused");
    }

    #[tokio::test]
    async fn exposing_layer_leaves_other_responses_alone() {
        let res = expose_internal_detail(AppError::not_found("Todo not found").into_response()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await["error"], "Todo not found");
    }
}
