use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::AuthUser,
    dto::auth::CredentialsRequest,
    errors::AppError,
    models::user::UserPublic,
    services::auth_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created", body = UserPublic),
        (status = 400, description = "Empty email or password"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserPublic>), AppError> {
    let user = auth_service::signup(&state, req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    put,
    path = "/api/users",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Credentials updated", body = UserPublic),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<UserPublic>, AppError> {
    let user = auth_service::update_credentials(&state, user_id, req).await?;
    Ok(Json(user.into()))
}
