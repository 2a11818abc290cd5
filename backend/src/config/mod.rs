//! Application configuration management

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Startup configuration failure. Fatal to process start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which store backs the mutation throttle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleBackend {
    /// In-process limiter; counters reset on restart
    Memory,
    /// Shared fixed-window counters in Redis
    Redis { url: String },
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// sqlx connection string (SQLite)
    pub database_url: String,

    /// Maximum connections in the pool
    pub database_max_connections: u32,

    /// Throttle store
    pub throttle_backend: ThrottleBackend,

    /// Mutations allowed per window per client identity
    pub throttle_limit: u32,

    /// Throttle window length
    pub throttle_window: Duration,

    /// Upper bound applied to pagination limits
    pub max_page_size: i32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let throttle_backend = match lookup("THROTTLE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => ThrottleBackend::Memory,
            "redis" => ThrottleBackend::Redis {
                url: lookup("REDIS_URL").ok_or(ConfigError::Missing("REDIS_URL"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "THROTTLE_BACKEND",
                    value: other.to_string(),
                    reason: "expected `memory` or `redis`".to_string(),
                });
            }
        };

        let throttle_limit: u32 = parse_or(&lookup, "THROTTLE_LIMIT", 20)?;
        if throttle_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "THROTTLE_LIMIT",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let window_secs: u64 = parse_or(&lookup, "THROTTLE_WINDOW_SECS", 60)?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "THROTTLE_WINDOW_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let max_page_size: i32 = parse_or(&lookup, "MAX_PAGE_SIZE", 100)?;
        if max_page_size < 1 {
            return Err(ConfigError::Invalid {
                key: "MAX_PAGE_SIZE",
                value: max_page_size.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3001)?,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:./data/scribe.db?mode=rwc".to_string()),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            throttle_backend,
            throttle_limit,
            throttle_window: Duration::from_secs(window_secs),
            max_page_size,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.throttle_backend, ThrottleBackend::Memory);
        assert_eq!(config.throttle_limit, 20);
        assert_eq!(config.throttle_window, Duration::from_secs(60));
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let err = config_from(&[("THROTTLE_BACKEND", "redis")]).unwrap_err();
        assert_matches!(err, ConfigError::Missing("REDIS_URL"));

        let config = config_from(&[
            ("THROTTLE_BACKEND", "Redis"),
            ("REDIS_URL", "redis://localhost:6379"),
        ])
        .unwrap();
        assert_eq!(
            config.throttle_backend,
            ThrottleBackend::Redis {
                url: "redis://localhost:6379".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_matches!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        );
        assert_matches!(
            config_from(&[("THROTTLE_LIMIT", "0")]),
            Err(ConfigError::Invalid {
                key: "THROTTLE_LIMIT",
                ..
            })
        );
        assert_matches!(
            config_from(&[("THROTTLE_BACKEND", "memcached")]),
            Err(ConfigError::Invalid {
                key: "THROTTLE_BACKEND",
                ..
            })
        );
    }
}
