/// Load Module
///
/// Handles storing chunks of records into the PostgreSQL database.
///
/// Each chunk gets its own connection and its own transaction: either every
/// record of the chunk is committed or none is. Nothing ties one chunk to the
/// next, so an earlier chunk stays committed when a later one fails.
use crate::audit::AuditLogger;
use crate::db::{close_quietly, Database, Warehouse};
use crate::error::{ChunkLoadError, LoadCause};
use crate::models::{Chunk, TransportRow};
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use std::sync::Arc;

/// Loads one chunk at a time and records each success in the audit log
pub struct TransactionalLoader<W: Warehouse> {
    warehouse: Arc<W>,
    audit: AuditLogger<W>,
}

impl<W: Warehouse> TransactionalLoader<W> {
    pub fn new(warehouse: Arc<W>, audit: AuditLogger<W>) -> Self {
        Self { warehouse, audit }
    }

    /// Load a chunk, consuming it
    ///
    /// Failures are returned, not logged; the caller owns failure reporting.
    pub async fn load(&self, chunk: Chunk) -> Result<usize, ChunkLoadError> {
        let inserted = self
            .warehouse
            .load_chunk(&chunk)
            .await
            .map_err(|cause| ChunkLoadError { chunk: chunk.ordinal, total: chunk.total, cause })?;

        self.audit
            .info(
                format!("Chunk {}/{} processed successfully", chunk.ordinal, chunk.total),
                Some(format!("Inserted {} records", inserted)),
            )
            .await;

        Ok(inserted)
    }
}

/// Insert a chunk within a database transaction on a dedicated connection
///
/// The connection is closed on every exit path.
pub async fn insert_chunk(database: &Database, chunk: &Chunk) -> Result<usize, LoadCause> {
    let mut conn = database.connect().await.map_err(LoadCause::Connection)?;

    let result = insert_in_transaction(&mut conn, chunk).await;
    close_quietly(conn).await;

    match &result {
        Ok(inserted) => tracing::info!("Committed chunk {}/{} ({} records)", chunk.ordinal, chunk.total, inserted),
        Err(e) => tracing::warn!("Rolled back chunk {}/{}: {}", chunk.ordinal, chunk.total, e),
    }
    result
}

async fn insert_in_transaction(conn: &mut PgConnection, chunk: &Chunk) -> Result<usize, LoadCause> {
    let mut tx = conn.begin().await.map_err(LoadCause::Connection)?;

    for (index, record) in chunk.records.iter().enumerate() {
        let row = index + 1;
        let outcome = match TransportRow::try_from(record) {
            Ok(typed) => insert_row(&mut tx, &typed).await.map_err(|source| LoadCause::Insert { row, source }),
            Err(source) => Err(LoadCause::Coercion { row, source }),
        };

        if let Err(cause) = outcome {
            if let Err(e) = tx.rollback().await {
                tracing::warn!("Rollback of chunk {}/{} failed: {}", chunk.ordinal, chunk.total, e);
            }
            return Err(cause);
        }
    }

    tx.commit().await.map_err(LoadCause::Commit)?;
    Ok(chunk.len())
}

async fn insert_row(conn: &mut PgConnection, row: &TransportRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO transport_data (id, name, email, age, city, salary, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        "#,
    )
    .bind(row.id)
    .bind(&row.name)
    .bind(&row.email)
    .bind(row.age)
    .bind(&row.city)
    .bind(&row.salary)
    .execute(&mut *conn)
    .await?;

    tracing::debug!("Inserted record {}", row.id);
    Ok(())
}
