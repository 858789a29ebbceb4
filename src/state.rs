use std::sync::Arc;

use chrono::Duration;

use crate::{
    auth::{Keys, RefreshTokenStore},
    config::{Config, StoreBackend},
    errors::AppError,
    store::{MemoryStore, MongoStore, RefreshTokenRepository, UserRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: RefreshTokenStore,
    pub keys: Keys,
    pub cfg: Arc<Config>,
}

impl AppState {
    pub fn new(
        cfg: &Config,
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens),
            keys: Keys::from_secret(cfg.jwt_secret.as_bytes()),
            cfg: Arc::new(cfg.clone()),
        }
    }

    /// Opens whichever backend the config names.
    pub async fn connect(cfg: &Config) -> Result<Self, AppError> {
        match &cfg.store {
            StoreBackend::Mongo { uri, db_name } => {
                let store = Arc::new(MongoStore::connect(uri, db_name).await?);
                Ok(Self::new(cfg, store.clone(), store))
            }
            StoreBackend::Memory => Ok(Self::in_memory(cfg)),
        }
    }

    pub fn in_memory(cfg: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(cfg, store.clone(), store)
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.cfg.jwt_access_ttl_seconds)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.cfg.refresh_ttl_seconds)
    }
}
