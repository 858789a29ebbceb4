use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, Bson, DateTime as BsonDateTime},
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RefreshTokenRepository, UserRepository};
use crate::{
    errors::{is_duplicate_key, AppError},
    models::{refresh_token::RefreshToken, user::User},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDoc {
    #[serde(rename = "_id")]
    id: String,

    email: String,
    password_hash: String,

    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RefreshTokenDoc {
    token: String,
    user_id: String,

    created_at: BsonDateTime,
    expires_at: BsonDateTime,

    revoked_at: Option<BsonDateTime>,
}

fn to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn from_bson(dt: BsonDateTime) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
        .ok_or_else(|| AppError::StoreFailure(format!("timestamp out of range: {dt:?}")))
}

fn parse_id(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s).map_err(|e| AppError::StoreFailure(format!("bad stored uuid {s:?}: {e}")))
}

impl From<&User> for UserDoc {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            created_at: to_bson(u.created_at),
            updated_at: to_bson(u.updated_at),
        }
    }
}

impl TryFrom<UserDoc> for User {
    type Error = AppError;

    fn try_from(d: UserDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&d.id)?,
            email: d.email,
            password_hash: d.password_hash,
            created_at: from_bson(d.created_at)?,
            updated_at: from_bson(d.updated_at)?,
        })
    }
}

impl From<&RefreshToken> for RefreshTokenDoc {
    fn from(t: &RefreshToken) -> Self {
        Self {
            token: t.token.clone(),
            user_id: t.user_id.to_string(),
            created_at: to_bson(t.created_at),
            expires_at: to_bson(t.expires_at),
            revoked_at: t.revoked_at.map(to_bson),
        }
    }
}

impl TryFrom<RefreshTokenDoc> for RefreshToken {
    type Error = AppError;

    fn try_from(d: RefreshTokenDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            token: d.token,
            user_id: parse_id(&d.user_id)?,
            created_at: from_bson(d.created_at)?,
            expires_at: from_bson(d.expires_at)?,
            revoked_at: d.revoked_at.map(from_bson).transpose()?,
        })
    }
}

/// MongoDB-backed store. The driver's client holds its own connection pool,
/// so one `MongoStore` is shared by every request.
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<UserDoc>,
    refresh_tokens: Collection<RefreshTokenDoc>,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, AppError> {
        let mut opts = ClientOptions::parse(uri).await?;
        opts.app_name = Some("chirp-auth".to_string());
        let client = Client::with_options(opts)?;
        let db = client.database(db_name);
        let users: Collection<UserDoc> = db.collection("users");
        let refresh_tokens: Collection<RefreshTokenDoc> = db.collection("refresh_tokens");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(email_index).await?;

        // uniqueness backstop for generated tokens
        let token_index = IndexModel::builder()
            .keys(doc! { "token": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        refresh_tokens.create_index(token_index).await?;

        let user_index = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        refresh_tokens.create_index(user_index).await?;

        tracing::info!(db = db_name, "mongo store ready");
        Ok(Self {
            users,
            refresh_tokens,
        })
    }
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.insert_one(UserDoc::from(user)).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict("user already exists".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users
            .find_one(doc! { "email": email })
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.users
            .find_one(doc! { "_id": id.to_string() })
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let res = self
            .users
            .replace_one(doc! { "_id": user.id.to_string() }, UserDoc::from(user))
            .await;
        match res {
            Ok(r) if r.matched_count == 0 => Err(AppError::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict("email already in use".into()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for MongoStore {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        self.refresh_tokens
            .insert_one(RefreshTokenDoc::from(token))
            .await?;
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        self.refresh_tokens
            .find_one(doc! { "token": token })
            .await?
            .map(RefreshToken::try_from)
            .transpose()
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        // the null guard keeps the first revocation time
        let res = self
            .refresh_tokens
            .update_one(
                doc! { "token": token, "revoked_at": Bson::Null },
                doc! { "$set": { "revoked_at": to_bson(at) } },
            )
            .await?;
        if res.matched_count > 0 {
            return Ok(true);
        }

        let existing = self
            .refresh_tokens
            .count_documents(doc! { "token": token })
            .await?;
        Ok(existing > 0)
    }
}
