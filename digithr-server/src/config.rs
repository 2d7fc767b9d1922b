//! Server configuration, read from the environment

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::crypto::BCRYPT_COST;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Clone, Deserialize)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// SQLite database file; in-memory stores when unset
    pub database_path: Option<String>,

    /// Cookie signing secret; a random key is generated when unset
    pub session_secret: Option<String>,

    /// Absolute session lifetime
    pub session_ttl_hours: i64,

    pub environment: Environment,

    /// Insert sample data when the user table is empty
    pub seed: bool,

    pub bcrypt_cost: u32,

    /// Allowed CORS origins in production
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3002,
            database_path: None,
            session_secret: None,
            session_ttl_hours: 24,
            environment: Environment::Development,
            seed: true,
            bcrypt_cost: BCRYPT_COST,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

// Hand-written so the secret never reaches the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<redacted>"))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("environment", &self.environment)
            .field("seed", &self.seed)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match var("APP_ENV").as_deref().map(str::trim) {
            Some("production") => Environment::Production,
            Some("development") | None => Environment::Development,
            Some(other) => {
                tracing::warn!(value = other, "Unknown APP_ENV, using development");
                Environment::Development
            }
        };

        let bcrypt_cost = parse_or(var("BCRYPT_COST"), "BCRYPT_COST", defaults.bcrypt_cost);
        let bcrypt_cost = if (4..=31).contains(&bcrypt_cost) {
            bcrypt_cost
        } else {
            tracing::warn!(value = bcrypt_cost, "BCRYPT_COST out of range, using default");
            defaults.bcrypt_cost
        };

        let session_ttl_hours =
            parse_or(var("SESSION_TTL_HOURS"), "SESSION_TTL_HOURS", defaults.session_ttl_hours);
        let session_ttl_hours = if session_ttl_hours > 0 {
            session_ttl_hours
        } else {
            tracing::warn!(value = session_ttl_hours, "SESSION_TTL_HOURS must be positive");
            defaults.session_ttl_hours
        };

        let cors_origins = match var("CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .filter(|o| {
                    if *o == "*" {
                        tracing::warn!("Ignoring wildcard CORS origin; list origins explicitly");
                    }
                    *o != "*"
                })
                .map(str::to_string)
                .collect(),
            None => defaults.cors_origins,
        };

        Self {
            port: parse_or(var("PORT"), "PORT", defaults.port),
            database_path: var("DATABASE_PATH"),
            session_secret: var("SESSION_SECRET"),
            session_ttl_hours,
            environment,
            seed: parse_or(var("DIGITHR_SEED"), "DIGITHR_SEED", defaults.seed),
            bcrypt_cost,
            cors_origins,
        }
    }
}

fn parse_or<T: FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]);
        assert_eq!(config.port, 3002);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.seed);
        assert!(config.database_path.is_none());
        assert!(config.session_secret.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("PORT", "8080"),
            ("DATABASE_PATH", "/var/lib/digithr/data.db"),
            ("APP_ENV", "production"),
            ("DIGITHR_SEED", "false"),
            ("CORS_ORIGINS", "https://digithr.ocp.ma, https://admin.ocp.ma"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path.as_deref(), Some("/var/lib/digithr/data.db"));
        assert!(config.environment.is_production());
        assert!(!config.seed);
        assert_eq!(
            config.cors_origins,
            vec!["https://digithr.ocp.ma", "https://admin.ocp.ma"]
        );
    }

    #[test]
    fn test_wildcard_origin_is_dropped() {
        let config = from_map(&[
            ("APP_ENV", "production"),
            ("CORS_ORIGINS", "*, https://digithr.ocp.ma"),
        ]);
        assert_eq!(config.cors_origins, vec!["https://digithr.ocp.ma"]);

        let config = from_map(&[("CORS_ORIGINS", "*")]);
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = from_map(&[
            ("PORT", "http"),
            ("SESSION_TTL_HOURS", "-3"),
            ("BCRYPT_COST", "99"),
        ]);
        assert_eq!(config.port, 3002);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.bcrypt_cost, BCRYPT_COST);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = from_map(&[("SESSION_SECRET", "digi-thr-secret-key")]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("digi-thr-secret-key"));
        assert!(printed.contains("<redacted>"));
    }
}
