use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::BearerToken,
    dto::auth::{CredentialsRequest, LoginResponse, RefreshResponse},
    errors::AppError,
    services::auth_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = LoginResponse),
        (status = 401, description = "Incorrect email or password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let out = auth_service::login(&state, req).await?;

    Ok(Json(LoginResponse {
        user: out.user.into(),
        token: out.tokens.access_token,
        refresh_token: out.tokens.refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Refresh token revoked, expired or missing"),
        (status = 404, description = "Unknown refresh token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> Result<Json<RefreshResponse>, AppError> {
    let token = auth_service::refresh(&state, &token).await?;
    Ok(Json(RefreshResponse { token }))
}

#[utoipa::path(
    post,
    path = "/api/revoke",
    responses(
        (status = 204, description = "Refresh token revoked"),
        (status = 404, description = "Unknown refresh token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&state, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}
