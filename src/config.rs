//! Service configuration, loaded from environment variables.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::codes::{KnownPrefixes, KnownPrefixesError};

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// PostgreSQL connection string. Without one the catalog lives in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// NATS server for domain events.
    pub nats_url: Option<String>,
    /// Categories with a fixed code prefix: the defaults plus `CATEGORY_PREFIXES`.
    pub known_prefixes: KnownPrefixes,
    /// JSON fixture loaded into an empty catalog at startup.
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
    #[error("CATEGORY_PREFIXES: {0}")]
    Prefixes(#[from] KnownPrefixesError),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let known_prefixes = match var("CATEGORY_PREFIXES") {
            Some(spec) => KnownPrefixes::parse(&spec)?.merged(KnownPrefixes::defaults().iter().map(|(g, p)| (g.to_string(), p.clone()))),
            None => KnownPrefixes::defaults(),
        };

        Ok(Self {
            port: parse_or(var("PORT"), "PORT", DEFAULT_PORT)?,
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            nats_url: var("NATS_URL"),
            known_prefixes,
            seed_path: var("SEED_PATH").map(PathBuf::from),
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(value) => value.parse().map_err(|_| ConfigError::NotANumber { name, value }),
        None => Ok(default),
    }
}
