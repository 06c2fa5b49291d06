/// Queries Module
///
/// Log appends plus the read-side queries used by the `logs` and `rows`
/// commands. The pipeline itself only ever appends.
use crate::models::{LogEntry, NewLogEntry, StoredRow};
use sqlx::postgres::PgConnection;

pub async fn insert_log_entry(conn: &mut PgConnection, entry: &NewLogEntry) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO process_logs (level, message, details) VALUES ($1, $2, $3)")
        .bind(entry.level.as_str())
        .bind(&entry.message)
        .bind(entry.details.as_deref())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Audit entries, newest first
pub async fn list_log_entries(conn: &mut PgConnection, limit: Option<i64>) -> Result<Vec<LogEntry>, sqlx::Error> {
    sqlx::query_as::<_, LogEntry>(
        "SELECT id, timestamp, level, message, details FROM process_logs ORDER BY timestamp DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
}

/// Loaded rows in id order
pub async fn list_rows(conn: &mut PgConnection, limit: Option<i64>) -> Result<Vec<StoredRow>, sqlx::Error> {
    sqlx::query_as::<_, StoredRow>(
        "SELECT id, name, email, age, city, salary, created_at FROM transport_data ORDER BY id LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
}

pub async fn count_rows(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transport_data").fetch_one(&mut *conn).await
}
