use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const ISSUER: &str = "chirpy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 key pair derived from the process signing secret. Built once at
/// startup and handed to whoever issues or checks access tokens.
#[derive(Clone)]
pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub fn new_access_claims(user_id: Uuid, ttl: Duration) -> Result<Claims, AppError> {
    let now = Utc::now();
    let exp = now.checked_add_signed(ttl).ok_or_else(|| {
        AppError::SessionCreationFailure(format!("access token ttl out of range: {ttl}"))
    })?;
    Ok(Claims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    })
}

pub fn make_token(claims: &Claims, keys: &Keys) -> Result<String, AppError> {
    encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
        .map_err(|e| AppError::SessionCreationFailure(format!("sign access token: {e}")))
}

pub fn issue_access_token(user_id: Uuid, keys: &Keys, ttl: Duration) -> Result<String, AppError> {
    make_token(&new_access_claims(user_id, ttl)?, keys)
}

fn validation() -> Validation {
    let mut v = Validation::new(Algorithm::HS256);
    v.leeway = 0;
    v.set_issuer(&[ISSUER]);
    v.set_required_spec_claims(&["exp", "iss", "sub"]);
    v
}

/// Checks signature, issuer and expiry, in that order, and returns the subject.
pub fn validate_access_token(token: &str, keys: &Keys) -> Result<Uuid, AppError> {
    let data = decode::<Claims>(token, &keys.decoding, &validation()).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidSignature => AppError::InvalidSignature,
            ErrorKind::ExpiredSignature => AppError::Expired,
            _ => AppError::MalformedToken,
        }
    })?;

    // jsonwebtoken still accepts exp == now
    if data.claims.exp <= Utc::now().timestamp() {
        return Err(AppError::Expired);
    }

    Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> Keys {
        Keys::from_secret(secret.as_bytes())
    }

    #[test]
    fn issued_token_validates_to_subject() {
        let k = keys("test-secret");
        let user = Uuid::new_v4();

        let token = issue_access_token(user, &k, Duration::hours(1)).unwrap();
        assert_eq!(validate_access_token(&token, &k).unwrap(), user);
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let token = issue_access_token(Uuid::new_v4(), &keys("one"), Duration::hours(1)).unwrap();

        let err = validate_access_token(&token, &keys("two")).unwrap_err();
        assert!(matches!(err, AppError::InvalidSignature));
    }

    #[test]
    fn elapsed_ttl_is_expired() {
        let k = keys("test-secret");
        let token = issue_access_token(Uuid::new_v4(), &k, Duration::seconds(-5)).unwrap();

        let err = validate_access_token(&token, &k).unwrap_err();
        assert!(matches!(err, AppError::Expired));
    }

    #[test]
    fn zero_ttl_is_expired() {
        let k = keys("test-secret");
        let token = issue_access_token(Uuid::new_v4(), &k, Duration::zero()).unwrap();

        let err = validate_access_token(&token, &k).unwrap_err();
        assert!(matches!(err, AppError::Expired));
    }

    #[test]
    fn unrepresentable_ttl_is_an_error() {
        let err = issue_access_token(Uuid::new_v4(), &keys("test-secret"), Duration::MAX)
            .unwrap_err();
        assert!(matches!(err, AppError::SessionCreationFailure(_)));
    }

    #[test]
    fn swapped_payload_is_invalid_signature() {
        let k = keys("test-secret");
        let mine = issue_access_token(Uuid::new_v4(), &k, Duration::hours(1)).unwrap();
        let theirs = issue_access_token(Uuid::new_v4(), &k, Duration::hours(1)).unwrap();

        let mine: Vec<&str> = mine.split('.').collect();
        let theirs: Vec<&str> = theirs.split('.').collect();
        let forged = format!("{}.{}.{}", mine[0], theirs[1], mine[2]);

        let err = validate_access_token(&forged, &k).unwrap_err();
        assert!(matches!(err, AppError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let k = keys("test-secret");
        for token in ["", "abc", "a.b.c", "not a token at all"] {
            let err = validate_access_token(token, &k).unwrap_err();
            assert!(matches!(err, AppError::MalformedToken), "{token:?}");
        }
    }

    #[test]
    fn foreign_issuer_is_malformed() {
        let k = keys("test-secret");
        let mut claims = new_access_claims(Uuid::new_v4(), Duration::hours(1)).unwrap();
        claims.iss = "someone-else".into();
        let token = make_token(&claims, &k).unwrap();

        let err = validate_access_token(&token, &k).unwrap_err();
        assert!(matches!(err, AppError::MalformedToken));
    }

    #[test]
    fn non_uuid_subject_is_malformed() {
        let k = keys("test-secret");
        let mut claims = new_access_claims(Uuid::new_v4(), Duration::hours(1)).unwrap();
        claims.sub = "admin".into();
        let token = make_token(&claims, &k).unwrap();

        let err = validate_access_token(&token, &k).unwrap_err();
        assert!(matches!(err, AppError::MalformedToken));
    }
}
