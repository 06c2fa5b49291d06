/// Audit Module
///
/// Best-effort progress log backed by the log table. A failed write is
/// reported through `tracing` and otherwise dropped, so callers have nothing
/// to handle.
use crate::db::Warehouse;
use crate::models::{LogLevel, NewLogEntry};
use std::sync::Arc;

pub struct AuditLogger<W: Warehouse> {
    warehouse: Arc<W>,
}

impl<W: Warehouse> Clone for AuditLogger<W> {
    fn clone(&self) -> Self {
        Self { warehouse: Arc::clone(&self.warehouse) }
    }
}

impl<W: Warehouse> AuditLogger<W> {
    pub fn new(warehouse: Arc<W>) -> Self {
        Self { warehouse }
    }

    /// Append one entry; never fails
    pub async fn log(&self, level: LogLevel, message: impl Into<String>, details: Option<String>) {
        let entry = NewLogEntry::new(level, message, details);
        let details = entry.details.as_deref().unwrap_or("");

        match level {
            LogLevel::Info => tracing::info!(details, "{}", entry.message),
            LogLevel::Warning => tracing::warn!(details, "{}", entry.message),
            LogLevel::Error => tracing::error!(details, "{}", entry.message),
        }

        if let Err(e) = self.warehouse.append_log(&entry).await {
            tracing::warn!("Error logging to database: {}", e);
        }
    }

    pub async fn info(&self, message: impl Into<String>, details: Option<String>) {
        self.log(LogLevel::Info, message, details).await;
    }

    pub async fn warning(&self, message: impl Into<String>, details: Option<String>) {
        self.log(LogLevel::Warning, message, details).await;
    }

    pub async fn error(&self, message: impl Into<String>, details: Option<String>) {
        self.log(LogLevel::Error, message, details).await;
    }
}
