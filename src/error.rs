/// Error Module
///
/// Errors that can cross the pipeline boundary, and the causes behind a
/// failed chunk load.
use thiserror::Error;

/// Missing or invalid settings, raised before any pipeline work starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Database configuration incomplete. Missing environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Chunk size must be greater than 0")]
    ZeroChunkSize,
}

/// A record value that could not be converted to its column type
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has invalid {expected} value '{value}'")]
    InvalidValue { field: &'static str, expected: &'static str, value: String },
}

/// Why a chunk's transaction was rolled back
#[derive(Debug, Error)]
pub enum LoadCause {
    #[error("connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("record {row}: {source}")]
    Coercion {
        row: usize,
        #[source]
        source: CoercionError,
    },

    #[error("record {row}: insert failed: {source}")]
    Insert {
        row: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("commit failed: {0}")]
    Commit(#[source] sqlx::Error),
}

/// A chunk failed to load; none of its records were persisted
#[derive(Debug, Error)]
#[error("Error processing chunk {chunk}/{total}: {cause}")]
pub struct ChunkLoadError {
    pub chunk: usize,
    pub total: usize,
    #[source]
    pub cause: LoadCause,
}

/// Failures surfaced to whoever triggered a pipeline run
#[derive(Debug, Error)]
pub enum IngestError {
    /// The chunk size was rejected while chunking. A `PipelineConfig` only
    /// holds a non-zero size, so runs built from one never return this;
    /// startup configuration failures surface as a bare `ConfigError`.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ChunkLoad(#[from] ChunkLoadError),
}
