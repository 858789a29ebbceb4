use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be {1}")]
    Invalid(&'static str, &'static str),
}

const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;
const MAX_TIMEOUT_SECONDS: i64 = 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo { uri: String, db_name: String },
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store: StoreBackend,

    pub jwt_secret: String,
    pub jwt_access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,

    pub bind_addr: String,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match var("STORE").as_deref() {
            Some("memory") => StoreBackend::Memory,
            None | Some("mongo") => StoreBackend::Mongo {
                uri: var("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
                db_name: var("DB_NAME").unwrap_or_else(|| "chirpy".to_string()),
            },
            Some(_) => return Err(ConfigError::Invalid("STORE", "\"mongo\" or \"memory\"")),
        };

        let jwt_secret = var("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_access_ttl_seconds =
            parse_positive(&var, "JWT_ACCESS_TTL_SECONDS", 60 * 60, MAX_TTL_SECONDS)?;
        let refresh_ttl_seconds =
            parse_positive(&var, "REFRESH_TTL_SECONDS", 60 * 24 * 60 * 60, MAX_TTL_SECONDS)?;
        let request_timeout_seconds =
            parse_positive(&var, "REQUEST_TIMEOUT_SECONDS", 10, MAX_TIMEOUT_SECONDS)? as u64;

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".into());

        Ok(Self {
            store,
            jwt_secret,
            jwt_access_ttl_seconds,
            refresh_ttl_seconds,
            bind_addr,
            request_timeout_seconds,
        })
    }

    /// In-memory config with the default TTLs, for tests and local experiments.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            store: StoreBackend::Memory,
            jwt_secret: jwt_secret.into(),
            jwt_access_ttl_seconds: 60 * 60,
            refresh_ttl_seconds: 60 * 24 * 60 * 60,
            bind_addr: "127.0.0.1:0".into(),
            request_timeout_seconds: 10,
        }
    }
}

// upper bounds keep `now + ttl` representable
fn parse_positive<F>(
    var: &F,
    key: &'static str,
    default: i64,
    max: i64,
) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0 && *n <= max)
            .ok_or(ConfigError::Invalid(key, "a positive integer within range")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("MONGODB_URI", "mongodb://localhost"), ("JWT_SECRET", "s")]).unwrap();

        assert_eq!(
            cfg.store,
            StoreBackend::Mongo {
                uri: "mongodb://localhost".into(),
                db_name: "chirpy".into()
            }
        );
        assert_eq!(cfg.jwt_access_ttl_seconds, 3600);
        assert_eq!(cfg.refresh_ttl_seconds, 60 * 24 * 3600);
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn secret_is_required() {
        let err = load(&[("STORE", "memory")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));

        let err = load(&[("STORE", "memory"), ("JWT_SECRET", "")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn mongo_needs_uri() {
        let err = load(&[("JWT_SECRET", "s")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MONGODB_URI")));
    }

    #[test]
    fn ttl_must_be_positive() {
        let err = load(&[
            ("STORE", "memory"),
            ("JWT_SECRET", "s"),
            ("JWT_ACCESS_TTL_SECONDS", "-3"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid("JWT_ACCESS_TTL_SECONDS", _)
        ));
    }

    #[test]
    fn ttl_has_an_upper_bound() {
        let err = load(&[
            ("STORE", "memory"),
            ("JWT_SECRET", "s"),
            ("REFRESH_TTL_SECONDS", "9000000000000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("REFRESH_TTL_SECONDS", _)));

        let ten_years = (10 * 365 * 24 * 60 * 60).to_string();
        let cfg = load(&[
            ("STORE", "memory"),
            ("JWT_SECRET", "s"),
            ("REFRESH_TTL_SECONDS", ten_years.as_str()),
        ])
        .unwrap();
        assert_eq!(cfg.refresh_ttl_seconds, 10 * 365 * 24 * 60 * 60);
    }
}
