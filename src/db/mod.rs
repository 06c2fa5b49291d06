/// Database Module
///
/// This module handles all PostgreSQL database operations including:
/// - Per-operation connection management (no shared pool)
/// - Create-if-absent schema initialization
/// - Chunk inserts, audit log appends and read-side queries
///
/// The pipeline talks to storage only through the [`Warehouse`] trait so the
/// orchestration logic can run against an in-memory store in tests.
pub mod queries;
pub mod schema;

#[cfg(test)]
pub mod memory;

use crate::config::DatabaseConfig;
use crate::error::LoadCause;
use crate::models::{Chunk, NewLogEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::Connection;

pub use schema::SchemaReport;

pub const DATA_TABLE: &str = "transport_data";
pub const LOG_TABLE: &str = "process_logs";

/// Storage operations the pipeline depends on
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Create the data and log tables if they are missing
    async fn ensure_schema(&self) -> Result<SchemaReport, sqlx::Error>;

    /// Insert every record of `chunk` in one transaction, returning the row count
    async fn load_chunk(&self, chunk: &Chunk) -> Result<usize, LoadCause>;

    /// Append one audit entry
    async fn append_log(&self, entry: &NewLogEntry) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed warehouse
///
/// Holds connection settings only. Every operation opens its own connection
/// and closes it before returning.
#[derive(Debug, Clone)]
pub struct Database {
    config: DatabaseConfig,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Open a fresh connection
    pub async fn connect(&self) -> Result<PgConnection, sqlx::Error> {
        PgConnection::connect_with(self.config.connect_options()).await
    }

    /// Test the database connection
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connect().await.context("Failed to connect to PostgreSQL database")?;
        sqlx::query("SELECT 1").execute(&mut conn).await.context("Database connection test failed")?;
        conn.close().await.context("Failed to close test connection")?;

        Ok(())
    }
}

#[async_trait]
impl Warehouse for Database {
    async fn ensure_schema(&self) -> Result<SchemaReport, sqlx::Error> {
        let mut conn = self.connect().await?;
        let result = schema::ensure_schema(&mut conn).await;
        close_quietly(conn).await;
        result
    }

    async fn load_chunk(&self, chunk: &Chunk) -> Result<usize, LoadCause> {
        crate::etl::load::insert_chunk(self, chunk).await
    }

    async fn append_log(&self, entry: &NewLogEntry) -> Result<(), sqlx::Error> {
        let mut conn = self.connect().await?;
        let result = queries::insert_log_entry(&mut conn, entry).await;
        close_quietly(conn).await;
        result
    }
}

/// Close a connection, reporting but not propagating failures
pub(crate) async fn close_quietly(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::warn!("Failed to close database connection cleanly: {}", e);
    }
}
