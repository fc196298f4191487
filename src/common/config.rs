// src/common/config.rs
//! Process configuration
//!
//! Everything security-relevant is read once at startup into [`AuthConfig`] and
//! handed to the components that need it. A missing or unparsable value stops
//! the process before the listener binds.

use std::env;
use std::fmt;
use std::time::Duration;

/// Minimum work factor accepted for the credential hasher (Argon2 time cost)
pub const MIN_HASH_COST: u32 = 1;

const DEFAULT_DATABASE_URL: &str = "sqlite://identity.db";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Secret material and hashing cost for the auth core
#[derive(Clone)]
pub struct AuthConfig {
    pub hash_cost: u32,
    pub signing_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("hash_cost", &self.hash_cost)
            .field("signing_secret", &"<redacted>")
            .finish()
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key-value source.
    ///
    /// `SIGNING_SECRET` wins over the legacy `JWT_PRIVATE_KEY` name when both are set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_cost = lookup("HASH_COST")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("HASH_COST"))?;

        let hash_cost: u32 = raw_cost.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "HASH_COST",
            reason: format!("'{}' is not a positive integer", raw_cost),
        })?;

        if hash_cost < MIN_HASH_COST {
            return Err(ConfigError::Invalid {
                key: "HASH_COST",
                reason: format!("must be at least {}", MIN_HASH_COST),
            });
        }

        let signing_secret = lookup("SIGNING_SECRET")
            .or_else(|| lookup("JWT_PRIVATE_KEY"))
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("SIGNING_SECRET"))?;

        Ok(Self {
            hash_cost,
            signing_secret,
        })
    }
}

/// Non-secret runtime settings with sensible defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub store_timeout: Duration,
    pub reset_db: bool,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                reason: format!("'{}' is not a valid port", raw),
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match lookup("STORE_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "STORE_TIMEOUT_SECS",
                        reason: format!("'{}' is not a positive number of seconds", raw),
                    })
                }
            },
            None => DEFAULT_STORE_TIMEOUT_SECS,
        };

        let reset_db = lookup("RESET_DB")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            port,
            store_timeout: Duration::from_secs(timeout_secs),
            reset_db,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_auth_config_loads_both_values() {
        let config =
            AuthConfig::from_lookup(source(&[("HASH_COST", "3"), ("SIGNING_SECRET", "s3cret")]))
                .unwrap();
        assert_eq!(config.hash_cost, 3);
        assert_eq!(config.signing_secret, "s3cret");
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = AuthConfig::from_lookup(source(&[("HASH_COST", "3")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SIGNING_SECRET"));

        let err = AuthConfig::from_lookup(source(&[("HASH_COST", "3"), ("SIGNING_SECRET", "")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("SIGNING_SECRET"));
    }

    #[test]
    fn test_legacy_secret_name_is_accepted() {
        let config =
            AuthConfig::from_lookup(source(&[("HASH_COST", "2"), ("JWT_PRIVATE_KEY", "legacy")]))
                .unwrap();
        assert_eq!(config.signing_secret, "legacy");
    }

    #[test]
    fn test_hash_cost_must_parse_and_respect_minimum() {
        let err = AuthConfig::from_lookup(source(&[("HASH_COST", "ten"), ("SIGNING_SECRET", "k")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "HASH_COST", .. }));

        let err = AuthConfig::from_lookup(source(&[("HASH_COST", "0"), ("SIGNING_SECRET", "k")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "HASH_COST", .. }));

        let err = AuthConfig::from_lookup(source(&[("SIGNING_SECRET", "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("HASH_COST"));
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let config =
            AuthConfig::from_lookup(source(&[("HASH_COST", "1"), ("SIGNING_SECRET", "hunter2")]))
                .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_lookup(source(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.store_timeout, Duration::from_secs(30));
        assert!(!config.reset_db);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_server_config_rejects_zero_timeout() {
        let err = ServerConfig::from_lookup(source(&[("STORE_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STORE_TIMEOUT_SECS", .. }));
    }
}
