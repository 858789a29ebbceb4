use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::error::{ErrorKind, WriteFailure};
use serde_json::json;
use thiserror::Error;

/// Every failure the auth core can surface. Token lifecycle kinds stay
/// distinct so logs and clients can tell them apart.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer credential")]
    MissingCredential,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token revoked")]
    Revoked,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Hashing failure: {0}")]
    HashingFailure(String),

    #[error("Verification failure: {0}")]
    VerificationFailure(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Session creation failure: {0}")]
    SessionCreationFailure(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials
            | AppError::MissingCredential
            | AppError::MalformedToken
            | AppError::InvalidSignature
            | AppError::Expired
            | AppError::Revoked => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::HashingFailure(_)
            | AppError::VerificationFailure(_)
            | AppError::StoreFailure(_)
            | AppError::SessionCreationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(crate) fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == 11000
    )
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::StoreFailure(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match &self {
            AppError::Validation(s) | AppError::Conflict(s) => s.as_str(),
            AppError::InvalidCredentials => "incorrect email or password",
            AppError::MissingCredential => "missing bearer token",
            AppError::MalformedToken => "malformed token",
            AppError::InvalidSignature => "invalid token",
            AppError::Expired => "token expired",
            AppError::Revoked => "token revoked",
            AppError::Forbidden => "forbidden",
            AppError::NotFound => "not found",
            AppError::HashingFailure(_)
            | AppError::VerificationFailure(_)
            | AppError::StoreFailure(_)
            | AppError::SessionCreationFailure(_) => {
                tracing::error!(error = %self, "request failed");
                "internal error"
            }
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}
