//! Configuration module for environment variables and application settings

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::Duration;

use crate::auth::TokenTtls;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3001/auth/magic-link";

#[derive(Debug, Clone)]
pub struct Config {
    /// HS256 secret shared by magic-link and session tokens
    pub jwt_secret: String,

    /// Magic links point here, with `?token=` appended
    pub frontend_url: String,

    /// `None` runs against the in-memory store
    pub database: Option<DatabaseSettings>,

    pub server: ServerConfig,

    pub smtp: SmtpConfig,

    /// Empty means any origin
    pub cors_allow_origins: Vec<String>,

    pub token_ttls: TokenTtls,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender_name: String,
    pub sender_email: String,
    pub use_tls: bool,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = non_empty("JWT_SECRET")
            .ok_or_else(|| anyhow!("JWT_SECRET environment variable is required"))?;

        let database = match non_empty("DATABASE_URL") {
            Some(url) => Some(DatabaseSettings {
                url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?,
            }),
            None => None,
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT has an invalid value {:?}", raw))?,
            None => parse_or(&lookup, "SERVER_PORT", 3000)?,
        };

        let use_tls = match non_empty("SMTP_TLS") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| anyhow!("SMTP_TLS has an invalid value {:?}", raw))?,
            None => true,
        };
        let username = non_empty("SMTP_EMAIL");
        let smtp = SmtpConfig {
            host: non_empty("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or(&lookup, "SMTP_PORT", 587)?,
            sender_email: username.clone().unwrap_or_else(|| "no-reply@localhost".to_string()),
            username,
            password: non_empty("SMTP_PASSWORD"),
            sender_name: non_empty("SMTP_SENDER_NAME").unwrap_or_else(|| "Recipe Costing".to_string()),
            use_tls,
        };

        let cors_allow_origins = non_empty("CORS_ALLOW_ORIGINS")
            .filter(|v| v != "*")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let magic_link_minutes: i64 = parse_or(&lookup, "MAGIC_LINK_TTL_MINUTES", 5)?;
        let session_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", 24)?;
        if magic_link_minutes <= 0 || session_hours <= 0 {
            anyhow::bail!("token lifetimes must be positive");
        }

        Ok(Self {
            jwt_secret,
            frontend_url: non_empty("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            database,
            server: ServerConfig {
                host: non_empty("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
            },
            smtp,
            cors_allow_origins,
            token_ttls: TokenTtls {
                magic_link: Duration::minutes(magic_link_minutes),
                session: Duration::hours(session_hours),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn requires_jwt_secret() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn applies_defaults() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.frontend_url, DEFAULT_FRONTEND_URL);
        assert!(config.database.is_none());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.use_tls);
        assert_eq!(config.smtp.sender_name, "Recipe Costing");
        assert!(config.cors_allow_origins.is_empty());
        assert_eq!(config.token_ttls.magic_link, Duration::minutes(5));
        assert_eq!(config.token_ttls.session, Duration::hours(24));
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://cogs@localhost/costing"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("SERVER_PORT", "8080"),
            ("SMTP_EMAIL", "kitchen@example.com"),
            ("SMTP_TLS", "false"),
            ("CORS_ALLOW_ORIGINS", "http://a.test, http://b.test"),
            ("MAGIC_LINK_TTL_MINUTES", "10"),
        ])
        .unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.max_connections, 4);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.smtp.sender_email, "kitchen@example.com");
        assert_eq!(config.smtp.username.as_deref(), Some("kitchen@example.com"));
        assert!(!config.smtp.use_tls);
        assert_eq!(config.cors_allow_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.token_ttls.magic_link, Duration::minutes(10));
    }

    #[test]
    fn port_takes_precedence_over_server_port() {
        let config = load(&[("JWT_SECRET", "s"), ("PORT", "5000"), ("SERVER_PORT", "8080")]).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(load(&[("JWT_SECRET", "s"), ("SERVER_PORT", "eighty")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("SMTP_TLS", "maybe")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("SESSION_TTL_HOURS", "0")]).is_err());
    }

    #[test]
    fn wildcard_cors_means_any_origin() {
        let config = load(&[("JWT_SECRET", "s"), ("CORS_ALLOW_ORIGINS", "*")]).unwrap();
        assert!(config.cors_allow_origins.is_empty());
    }
}
