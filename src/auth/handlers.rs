use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        services::AuthService,
    },
    error::AppError,
    extractors::ApiJson,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let res = auth
        .register(&payload.email, &payload.password, payload.name.as_deref())
        .await?;
    Ok(ApiResponse::created("User registered successfully", res))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let res = auth.login(&payload.email, &payload.password).await?;
    Ok(ApiResponse::ok("Login successful", res))
}

#[instrument(skip(auth))]
pub async fn profile(
    State(auth): State<AuthService>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let user = auth.profile(user_id).await?;
    Ok(ApiResponse::ok("Profile retrieved successfully", user))
}
