use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    handlers::{auth as auth_handlers, health, users as user_handlers},
    openapi::openapi_json,
    state::AppState,
};

pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/openapi.json", get(openapi_json))
        .route(
            "/users",
            post(user_handlers::create_user).put(user_handlers::update_user),
        )
        .route("/login", post(auth_handlers::login))
        .route("/refresh", post(auth_handlers::refresh))
        .route("/revoke", post(auth_handlers::revoke));

    Router::new().nest("/api", api).with_state(state)
}
