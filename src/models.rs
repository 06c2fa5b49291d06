/// Data Models Module
///
/// This module defines the core data structures used throughout the application.
/// These models represent parsed CSV rows, the chunks they are loaded in,
/// and the audit log entries recorded while a file is processed.
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::BigDecimal;
use std::collections::HashMap;

/// One parsed data row: header name -> raw string value
///
/// Fields missing from a short line are absent rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    #[cfg(test)]
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// An ordered batch of records loaded under a single transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 1-based position of this chunk within the file
    pub ordinal: usize,
    pub total: usize,
    pub records: Vec<Record>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// A record coerced into the column types of the data table
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub city: String,
    pub salary: BigDecimal,
}

/// A persisted data row, as read back from the data table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub city: String,
    pub salary: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// Severity of an audit log entry
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit entry waiting to be written; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub level: LogLevel,
    pub message: String,
    pub details: Option<String>,
}

impl NewLogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, details: Option<String>) -> Self {
        Self { level, message: message.into(), details }
    }
}

/// A persisted audit entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub details: Option<String>,
}

/// A newly created object in the watched storage location
#[derive(Debug, Clone)]
pub struct BlobEvent {
    pub name: String,
    pub content: Vec<u8>,
}

impl BlobEvent {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), content: content.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_pairs() {
        let record: Record = [("id", "1"), ("name", "Ada")].into_iter().collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("name"), Some("Ada"));
        assert_eq!(record.get("email"), None);
    }

    #[test]
    fn test_log_level_strings() {
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Warning.to_string(), "warning");
        assert_eq!(serde_json::to_string(&LogLevel::Error).unwrap(), "\"error\"");
    }
}
