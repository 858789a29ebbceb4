use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RefreshTokenRepository, UserRepository};
use crate::{
    errors::AppError,
    models::{refresh_token::RefreshToken, user::User},
};

/// Process-local store with the same uniqueness rules as the Mongo indexes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read()
        .map_err(|_| AppError::StoreFailure("memory store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write()
        .map_err(|_| AppError::StoreFailure("memory store lock poisoned".into()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == user.email) || users.contains_key(&user.id) {
            return Err(AppError::Conflict("user already exists".into()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = read(&self.users)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = read(&self.users)?;
        Ok(users.get(&id).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = write(&self.users)?;
        if users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(AppError::Conflict("email already in use".into()));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        let mut tokens = write(&self.refresh_tokens)?;
        if tokens.contains_key(&token.token) {
            return Err(AppError::StoreFailure("duplicate refresh token".into()));
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let tokens = read(&self.refresh_tokens)?;
        Ok(tokens.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut tokens = write(&self.refresh_tokens)?;
        match tokens.get_mut(token) {
            Some(row) => {
                row.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_row(token: &str) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            token: token.to_string(),
            user_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + Duration::days(60),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store
            .insert_user(&User::new("a@x.com".into(), "h".into()))
            .await
            .unwrap();

        let err = store
            .insert_user(&User::new("a@x.com".into(), "h2".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_rejects_taken_email_and_missing_user() {
        let store = MemoryStore::new();
        let a = User::new("a@x.com".into(), "h".into());
        let b = User::new("b@x.com".into(), "h".into());
        store.insert_user(&a).await.unwrap();
        store.insert_user(&b).await.unwrap();

        let mut moved = b.clone();
        moved.email = "a@x.com".into();
        assert!(matches!(
            store.update_user(&moved).await,
            Err(AppError::Conflict(_))
        ));

        let ghost = User::new("ghost@x.com".into(), "h".into());
        assert!(matches!(
            store.update_user(&ghost).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_token_is_a_store_failure() {
        let store = MemoryStore::new();
        store.insert_refresh_token(&token_row("abc")).await.unwrap();

        let err = store.insert_refresh_token(&token_row("abc")).await.unwrap_err();
        assert!(matches!(err, AppError::StoreFailure(_)));
    }

    #[tokio::test]
    async fn mark_revoked_keeps_first_timestamp() {
        let store = MemoryStore::new();
        store.insert_refresh_token(&token_row("abc")).await.unwrap();

        let first = Utc::now();
        assert!(store.mark_revoked("abc", first).await.unwrap());
        assert!(store
            .mark_revoked("abc", first + Duration::minutes(5))
            .await
            .unwrap());
        assert!(!store.mark_revoked("missing", first).await.unwrap());

        let row = store.find_refresh_token("abc").await.unwrap().unwrap();
        assert_eq!(row.revoked_at, Some(first));
    }
}
