use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use super::jwt::{validate_access_token, Keys};
use crate::{errors::AppError, state::AppState};

/// Token from `Authorization: Bearer <token>`. Any other shape is `MissingCredential`.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AppError> {
    let Authorization(bearer) = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::MissingCredential)?;

    let token = bearer.token().trim();
    if token.is_empty() {
        return Err(AppError::MissingCredential);
    }
    Ok(token.to_owned())
}

pub fn authenticate(headers: &HeaderMap, keys: &Keys) -> Result<Uuid, AppError> {
    let token = extract_bearer(headers)?;
    validate_access_token(&token, keys)
}

/// Callers load the resource owner first; this only compares.
pub fn authorize_ownership(acting_user_id: Uuid, resource_owner_id: Uuid) -> Result<(), AppError> {
    if acting_user_id != resource_owner_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Identity behind a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = authenticate(&parts.headers, &state.keys).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            e
        })?;
        Ok(Self(user_id))
    }
}

/// Raw bearer string, for endpoints that take a refresh token in the header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_bearer(&parts.headers).map(Self)
    }
}
