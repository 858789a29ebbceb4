use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    dto::auth::{CredentialsRequest, LoginResponse, RefreshResponse},
    handlers,
    models::user::UserPublic,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::healthz,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::revoke,
    ),
    components(schemas(CredentialsRequest, LoginResponse, RefreshResponse, UserPublic)),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Login, refresh and revocation"),
        (name = "users", description = "Credential management")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
