//! Session lifecycle: signup, credential update, login, refresh, logout.
//!
//! A session moves Anonymous -> Authenticated -> AccessExpired (refresh still
//! good) -> Revoked or Expired. Only the refresh token carries server state;
//! access tokens live out their TTL.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::jwt::issue_access_token,
    dto::auth::CredentialsRequest,
    errors::AppError,
    models::user::User,
    password::{hash_password, verify_dummy, verify_password},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub user: User,
    pub tokens: IssuedTokens,
}

fn normalize_credentials(req: &CredentialsRequest) -> Result<String, AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("email/password required".into()));
    }
    Ok(email)
}

pub async fn signup(state: &AppState, req: CredentialsRequest) -> Result<User, AppError> {
    let email = normalize_credentials(&req)?;

    if state.users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("user already exists".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::new(email, password_hash);
    state.users.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, "user created");
    Ok(user)
}

/// Re-hashes the password; email may change too.
pub async fn update_credentials(
    state: &AppState,
    user_id: Uuid,
    req: CredentialsRequest,
) -> Result<User, AppError> {
    let email = normalize_credentials(&req)?;

    let mut user = state
        .users
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    user.email = email;
    user.password_hash = hash_password(&req.password)?;
    user.updated_at = Utc::now();
    state.users.update_user(&user).await?;

    tracing::info!(%user_id, "credentials updated");
    Ok(user)
}

// Signs first so a signing failure never leaves a stored token behind.
async fn issue_tokens_and_store_refresh(
    state: &AppState,
    user_id: Uuid,
) -> Result<IssuedTokens, AppError> {
    let access_token = issue_access_token(user_id, &state.keys, state.access_ttl())?;

    let refresh = state
        .refresh_tokens
        .create(user_id, state.refresh_ttl())
        .await
        .map_err(|e| {
            tracing::error!(%user_id, error = %e, "could not persist refresh token");
            AppError::SessionCreationFailure(e.to_string())
        })?;

    Ok(IssuedTokens {
        access_token,
        refresh_token: refresh.token,
    })
}

/// Unknown email and wrong password fail identically.
pub async fn login(state: &AppState, req: CredentialsRequest) -> Result<LoginOutput, AppError> {
    let email = req.email.trim().to_lowercase();

    let Some(user) = state.users.find_user_by_email(&email).await? else {
        verify_dummy(&req.password);
        tracing::info!("login rejected");
        return Err(AppError::InvalidCredentials);
    };

    let matched = verify_password(&req.password, &user.password_hash).map_err(|e| {
        tracing::warn!(user_id = %user.id, error = %e, "stored password hash unusable");
        e
    })?;
    if !matched {
        tracing::info!(user_id = %user.id, "login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let tokens = issue_tokens_and_store_refresh(state, user.id).await?;
    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(LoginOutput { user, tokens })
}

/// Mints a new access token. The refresh token itself is reused, not rotated.
pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<String, AppError> {
    let user_id = state
        .refresh_tokens
        .validate_active(refresh_token)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "refresh rejected");
            e
        })?;

    issue_access_token(user_id, &state.keys, state.access_ttl())
}

pub async fn logout(state: &AppState, refresh_token: &str) -> Result<(), AppError> {
    state.refresh_tokens.revoke(refresh_token).await?;
    tracing::debug!("refresh token revoked");
    Ok(())
}
