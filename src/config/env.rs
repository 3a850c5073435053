//! Process configuration loaded once from the environment (and `.env` via dotenvy).

use crate::error::ConfigError;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Execution environment flag (`APP_ENV`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvVar {
                name: "APP_ENV".into(),
                reason: format!("{} (expected development, test or production)", s),
            }),
        }
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

/// Where documents live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// In-process store, `DATABASE_URL=memory://`.
    Memory,
    /// Full PostgreSQL connection string.
    Url(String),
    /// Assembled from DB_USER / DB_PASSWORD / DB_HOST / DB_NAME.
    Parts {
        host: String,
        port: Option<u16>,
        user: String,
        password: String,
        database: String,
    },
}

pub const MEMORY_URL: &str = "memory://";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    pub database: DatabaseTarget,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub shutdown_grace: Duration,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let port: u16 = parse_var("PORT", &require("PORT")?)?;
        let environment: Environment = require("APP_ENV")?.parse()?;

        let database = match get("DATABASE_URL") {
            Some(url) if url == MEMORY_URL => DatabaseTarget::Memory,
            Some(url) => DatabaseTarget::Url(url),
            None => DatabaseTarget::Parts {
                host: require("DB_HOST")?,
                port: get("DB_PORT").map(|p| parse_var("DB_PORT", &p)).transpose()?,
                user: require("DB_USER")?,
                password: require("DB_PASSWORD")?,
                database: require("DB_NAME")?,
            },
        };

        let host = match get("HOST") {
            Some(h) => parse_var("HOST", &h)?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let db_max_connections = get("DB_MAX_CONNECTIONS")
            .map(|v| parse_var("DB_MAX_CONNECTIONS", &v))
            .transpose()?
            .unwrap_or(5);
        let db_connect_timeout = get("DB_CONNECT_TIMEOUT_SECS")
            .map(|v| parse_var("DB_CONNECT_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));
        let shutdown_grace = get("SHUTDOWN_GRACE_SECS")
            .map(|v| parse_var("SHUTDOWN_GRACE_SECS", &v))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty() && s != "*")
                    .collect()
            })
            .unwrap_or_default();
        let body_limit_bytes = get("BODY_LIMIT_BYTES")
            .map(|v| parse_var("BODY_LIMIT_BYTES", &v))
            .transpose()?
            .unwrap_or(1024 * 1024);

        Ok(AppConfig {
            host,
            port,
            environment,
            database,
            db_max_connections,
            db_connect_timeout,
            shutdown_grace,
            cors_origins,
            body_limit_bytes,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
