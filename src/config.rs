/// Configuration Module
///
/// Builds the validated settings injected into the pipeline. Values come
/// from CLI overrides first, then the environment (loaded from `.env` by main).
use crate::error::ConfigError;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

const REQUIRED_PG_VARS: [&str; 4] = ["PGHOST", "PGDATABASE", "PGUSER", "PGPASSWORD"];

/// Connection settings for the target database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    options: PgConnectOptions,
}

impl DatabaseConfig {
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let options = PgConnectOptions::from_str(url).map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
        Ok(Self { options })
    }

    #[cfg(test)]
    pub fn from_options(options: PgConnectOptions) -> Self {
        Self { options }
    }

    /// Resolve from `DATABASE_URL`, falling back to the discrete `PG*` variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            return Self::from_url(&url);
        }

        let missing: Vec<String> =
            REQUIRED_PG_VARS.iter().filter(|key| get(**key).is_none()).map(|key| key.to_string()).collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        let value = |key: &str| get(key).unwrap_or_default();
        let mut options = PgConnectOptions::new()
            .host(&value("PGHOST"))
            .database(&value("PGDATABASE"))
            .username(&value("PGUSER"))
            .password(&value("PGPASSWORD"));

        if let Some(port) = get("PGPORT") {
            let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidValue { name: "PGPORT".to_string(), value: port })?;
            options = options.port(port);
        }

        if let Some(mode) = get("PGSSLMODE") {
            let mode = PgSslMode::from_str(&mode)
                .map_err(|_| ConfigError::InvalidValue { name: "PGSSLMODE".to_string(), value: mode })?;
            options = options.ssl_mode(mode);
        }

        Ok(Self { options })
    }

    pub fn connect_options(&self) -> &PgConnectOptions {
        &self.options
    }
}

/// Settings for the pipeline orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    chunk_size: usize,
}

impl PipelineConfig {
    pub fn new(chunk_size: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

/// Everything the binary needs, validated once at startup
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
}

impl IngestConfig {
    /// Build from CLI overrides and an environment lookup
    pub fn resolve<F>(database_url: Option<&str>, chunk_size: Option<usize>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = match database_url {
            Some(url) => DatabaseConfig::from_url(url)?,
            None => DatabaseConfig::from_lookup(&lookup)?,
        };

        let chunk_size = match chunk_size {
            Some(size) => size,
            None => match lookup("CHUNK_SIZE") {
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue { name: "CHUNK_SIZE".to_string(), value: raw })?,
                None => DEFAULT_CHUNK_SIZE,
            },
        };

        Ok(Self { database, pipeline: PipelineConfig::new(chunk_size)? })
    }

    pub fn from_env(database_url: Option<&str>, chunk_size: Option<usize>) -> Result<Self, ConfigError> {
        Self::resolve(database_url, chunk_size, |key| std::env::var(key).ok())
    }
}
