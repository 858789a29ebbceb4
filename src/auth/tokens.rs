use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

use crate::{errors::AppError, models::refresh_token::RefreshToken, store::RefreshTokenRepository};

/// 256 bits from the OS generator as 64 hex chars.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues, looks up and revokes opaque refresh tokens. Expiry is only ever
/// checked on read; nothing sweeps old rows.
#[derive(Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user_id: Uuid, ttl: Duration) -> Result<RefreshToken, AppError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::SessionCreationFailure(format!("refresh token ttl out of range: {ttl}"))
        })?;
        let row = RefreshToken {
            token: generate_refresh_token(),
            user_id,
            created_at: now,
            expires_at,
            revoked_at: None,
        };

        self.repo.insert_refresh_token(&row).await?;

        tracing::debug!(%user_id, expires_at = %row.expires_at, "refresh token created");
        Ok(row)
    }

    pub async fn lookup(&self, token: &str) -> Result<RefreshToken, AppError> {
        self.repo
            .find_refresh_token(token)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Returns the owner of a token that exists, is not revoked and has not expired.
    /// A revoked token reports `Revoked` even after it has also expired.
    pub async fn validate_active(&self, token: &str) -> Result<Uuid, AppError> {
        let row = self.lookup(token).await?;

        if row.is_revoked() {
            return Err(AppError::Revoked);
        }
        if row.is_expired_at(Utc::now()) {
            return Err(AppError::Expired);
        }
        Ok(row.user_id)
    }

    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        if !self.repo.mark_revoked(token, Utc::now()).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> RefreshTokenStore {
        RefreshTokenStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn generated_tokens_are_64_hex_chars() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn created_token_is_active() {
        let s = store();
        let user = Uuid::new_v4();

        let row = s.create(user, Duration::days(60)).await.unwrap();
        assert!(row.revoked_at.is_none());
        assert_eq!(s.validate_active(&row.token).await.unwrap(), user);
        assert_eq!(s.lookup(&row.token).await.unwrap(), row);
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let s = store();
        let row = s.create(Uuid::new_v4(), Duration::days(60)).await.unwrap();

        s.revoke(&row.token).await.unwrap();
        s.revoke(&row.token).await.unwrap();

        let err = s.validate_active(&row.token).await.unwrap_err();
        assert!(matches!(err, AppError::Revoked));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let s = store();

        assert!(matches!(
            s.validate_active("deadbeef").await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(s.revoke("deadbeef").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn expired_token_reports_expired_not_revoked() {
        let s = store();
        let row = s.create(Uuid::new_v4(), Duration::seconds(-1)).await.unwrap();

        let err = s.validate_active(&row.token).await.unwrap_err();
        assert!(matches!(err, AppError::Expired));
    }

    #[tokio::test]
    async fn unrepresentable_ttl_is_an_error_not_a_panic() {
        let s = store();

        let err = s.create(Uuid::new_v4(), Duration::MAX).await.unwrap_err();
        assert!(matches!(err, AppError::SessionCreationFailure(_)));
    }

    #[tokio::test]
    async fn many_tokens_per_user() {
        let s = store();
        let user = Uuid::new_v4();

        let first = s.create(user, Duration::days(60)).await.unwrap();
        let second = s.create(user, Duration::days(60)).await.unwrap();
        s.revoke(&first.token).await.unwrap();

        assert_eq!(s.validate_active(&second.token).await.unwrap(), user);
    }
}
