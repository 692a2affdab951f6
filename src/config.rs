//! Process configuration from environment variables.

use crate::error::ConfigError;
use crate::schema::validate_schema_name;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/school";
pub const DEFAULT_SCHEMA: &str = "school";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Backing store for resource rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    /// PostgreSQL through `DATABASE_URL`.
    Postgres,
    /// Process memory; contents are lost on exit.
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "SCHOOL_STORE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub schema: String,
    pub store: StoreKind,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
}

fn parse_var<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Read `DATABASE_URL`, `SCHOOL_SCHEMA`, `SCHOOL_STORE`, `BIND_ADDR` and `DB_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let schema = get("SCHOOL_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        validate_schema_name(&schema)?;
        let store = match get("SCHOOL_STORE") {
            Some(v) => v.parse()?,
            None => StoreKind::Postgres,
        };
        let default_addr = SocketAddr::from(([0, 0, 0, 0], 3000));
        let max_connections = parse_var("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DB_MAX_CONNECTIONS",
                value: "0".into(),
            });
        }
        Ok(AppConfig {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            schema,
            store,
            bind_addr: parse_var("BIND_ADDR", get("BIND_ADDR"), default_addr)?,
            max_connections,
        })
    }
}
