//! In-memory warehouse for exercising the pipeline without PostgreSQL.
//!
//! Mirrors the transactional behaviour of [`Database`](super::Database):
//! a chunk's rows are staged and only become visible once every record in
//! it has coerced and passed the primary-key check. Failures for schema
//! setup and log writes can be switched on to test best-effort paths.

use super::{SchemaReport, Warehouse};
use crate::error::LoadCause;
use crate::models::{Chunk, NewLogEntry, TransportRow};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    schema_ready: bool,
    rows: BTreeMap<i32, TransportRow>,
    logs: Vec<NewLogEntry>,
    load_calls: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    state: Mutex<State>,
    fail_schema: AtomicBool,
    fail_logs: AtomicBool,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every schema pass fail
    pub fn fail_schema(&self, fail: bool) {
        self.fail_schema.store(fail, Ordering::SeqCst);
    }

    /// Make every log append fail
    pub fn fail_logs(&self, fail: bool) {
        self.fail_logs.store(fail, Ordering::SeqCst);
    }

    /// Pre-populate committed rows
    pub fn seed(&self, rows: impl IntoIterator<Item = TransportRow>) {
        let mut state = self.state.lock().unwrap();
        for row in rows {
            state.rows.insert(row.id, row);
        }
    }

    pub fn row_ids(&self) -> Vec<i32> {
        self.state.lock().unwrap().rows.keys().copied().collect()
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    pub fn logs(&self) -> Vec<NewLogEntry> {
        self.state.lock().unwrap().logs.clone()
    }

    /// Ordinals of every chunk handed to `load_chunk`, in call order
    pub fn load_calls(&self) -> Vec<usize> {
        self.state.lock().unwrap().load_calls.clone()
    }

    pub fn schema_ready(&self) -> bool {
        self.state.lock().unwrap().schema_ready
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn ensure_schema(&self) -> Result<SchemaReport, sqlx::Error> {
        if self.fail_schema.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("schema initialization unavailable".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let created = !state.schema_ready;
        state.schema_ready = true;
        Ok(SchemaReport { created_data_table: created, created_log_table: created })
    }

    async fn load_chunk(&self, chunk: &Chunk) -> Result<usize, LoadCause> {
        let mut state = self.state.lock().unwrap();
        state.load_calls.push(chunk.ordinal);

        let mut staged: BTreeMap<i32, TransportRow> = BTreeMap::new();
        for (index, record) in chunk.records.iter().enumerate() {
            let row = index + 1;
            let typed = TransportRow::try_from(record).map_err(|source| LoadCause::Coercion { row, source })?;

            if state.rows.contains_key(&typed.id) || staged.contains_key(&typed.id) {
                return Err(LoadCause::Insert {
                    row,
                    source: sqlx::Error::Protocol(format!(
                        "duplicate key value violates unique constraint \"transport_data_pkey\": id={}",
                        typed.id
                    )),
                });
            }
            staged.insert(typed.id, typed);
        }

        let inserted = staged.len();
        state.rows.extend(staged);
        Ok(inserted)
    }

    async fn append_log(&self, entry: &NewLogEntry) -> Result<(), sqlx::Error> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("log store unavailable".to_string()));
        }

        self.state.lock().unwrap().logs.push(entry.clone());
        Ok(())
    }
}
