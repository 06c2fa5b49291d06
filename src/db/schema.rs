/// Schema Module
///
/// Create-if-absent initialization for the data and log tables. Safe to run
/// on every invocation. Two first runs racing on the existence check are not
/// guarded against.
use super::{DATA_TABLE, LOG_TABLE};
use sqlx::postgres::PgConnection;
use sqlx::Connection;

const CREATE_DATA_TABLE: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS transport_data (
        id INTEGER NOT NULL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        age INTEGER NOT NULL,
        city VARCHAR(100) NOT NULL,
        salary NUMERIC(18, 2) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_transport_data_created_at ON transport_data (created_at)",
];

const CREATE_LOG_TABLE: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS process_logs (
        id BIGSERIAL PRIMARY KEY,
        timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        level VARCHAR(50) NOT NULL,
        message TEXT NOT NULL,
        details TEXT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_process_logs_timestamp ON process_logs (timestamp DESC)",
    "CREATE INDEX IF NOT EXISTS ix_process_logs_level ON process_logs (level)",
];

/// Which tables a schema pass had to create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub created_data_table: bool,
    pub created_log_table: bool,
}

pub async fn table_exists(conn: &mut PgConnection, table: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await
}

/// Ensure both tables and their indexes exist
pub async fn ensure_schema(conn: &mut PgConnection) -> Result<SchemaReport, sqlx::Error> {
    let created_data_table = create_if_absent(conn, DATA_TABLE, &CREATE_DATA_TABLE).await?;
    let created_log_table = create_if_absent(conn, LOG_TABLE, &CREATE_LOG_TABLE).await?;

    Ok(SchemaReport { created_data_table, created_log_table })
}

async fn create_if_absent(conn: &mut PgConnection, table: &str, statements: &[&str]) -> Result<bool, sqlx::Error> {
    if table_exists(conn, table).await? {
        return Ok(false);
    }

    // Table and indexes appear together or not at all.
    let mut tx = conn.begin().await?;
    for statement in statements {
        sqlx::query(*statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Created table {}", table);
    Ok(true)
}
