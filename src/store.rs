//! Persistence seams for the two entities the auth core owns.
//!
//! `MongoStore` backs the running service; `MemoryStore` serves tests and
//! database-less local runs.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{refresh_token::RefreshToken, user::User},
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Replaces the stored row keyed by `user.id`. `NotFound` if it is gone,
    /// `Conflict` if the new email belongs to another user.
    async fn update_user(&self, user: &User) -> Result<(), AppError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError>;

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError>;

    /// Sets `revoked_at` only when it is still null. Returns whether the token
    /// exists at all, revoked before or not.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AppError>;
}
