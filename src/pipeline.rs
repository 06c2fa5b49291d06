/// Pipeline Module
///
/// Orchestrates one ingestion run per dropped file: Schema → Parse → Chunk → Load,
/// with audit logging at every step.
///
/// Chunks are loaded strictly in order, each awaited to completion before the
/// next begins. The first failing chunk ends the run; chunks already committed
/// stay committed and later chunks are never attempted.
use crate::audit::AuditLogger;
use crate::config::PipelineConfig;
use crate::db::Warehouse;
use crate::error::IngestError;
use crate::etl::{extract::parse_csv, load::TransactionalLoader, transform::chunk_records};
use crate::models::BlobEvent;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    SchemaReady,
    Parsed { records: usize },
    Chunked { chunks: usize },
    Loading { chunk: usize, total: usize },
    Completed { records: usize },
    Failed { chunk: usize, total: usize },
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::SchemaReady => write!(f, "SchemaReady"),
            PipelineState::Parsed { records } => write!(f, "Parsed({} records)", records),
            PipelineState::Chunked { chunks } => write!(f, "Chunked({} chunks)", chunks),
            PipelineState::Loading { chunk, total } => write!(f, "Loading({} of {})", chunk, total),
            PipelineState::Completed { records: 0 } => write!(f, "Completed(empty)"),
            PipelineState::Completed { records } => write!(f, "Completed({} records)", records),
            PipelineState::Failed { chunk, total } => write!(f, "Failed(chunk {} of {})", chunk, total),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub file: String,
    pub state: PipelineState,
    pub records_parsed: usize,
    pub chunks_total: usize,
    pub chunks_committed: usize,
    pub rows_committed: usize,
    pub elapsed_time: Duration,
}

impl RunReport {
    fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            state: PipelineState::Idle,
            records_parsed: 0,
            chunks_total: 0,
            chunks_committed: 0,
            rows_committed: 0,
            elapsed_time: Duration::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records_parsed == 0
    }

    fn advance(&mut self, next: PipelineState) {
        tracing::debug!(file = %self.file, "Pipeline state {} -> {}", self.state, next);
        self.state = next;
    }
}

/// CSV ingestion pipeline
pub struct Pipeline<W: Warehouse> {
    warehouse: Arc<W>,
    loader: TransactionalLoader<W>,
    audit: AuditLogger<W>,
    config: PipelineConfig,
}

impl<W: Warehouse> Pipeline<W> {
    /// Create a new pipeline instance
    pub fn new(warehouse: Arc<W>, config: PipelineConfig) -> Self {
        let audit = AuditLogger::new(Arc::clone(&warehouse));
        let loader = TransactionalLoader::new(Arc::clone(&warehouse), audit.clone());
        Self { warehouse, loader, audit, config }
    }

    /// Process one newly arrived file
    ///
    /// Only a chunk load failure is returned as an error; a file with no data
    /// rows completes with a warning.
    pub async fn run(&self, event: &BlobEvent) -> Result<RunReport, IngestError> {
        let start_time = Instant::now();
        let mut report = RunReport::new(&event.name);
        let file_details = || Some(format!("File: {}", event.name));

        tracing::info!("Blob trigger function processed blob: {}", event.name);

        self.initialize_schema().await;
        report.advance(PipelineState::SchemaReady);

        self.audit.info("CSV file detected in blob storage", file_details()).await;

        let records = parse_csv(&event.content);
        report.records_parsed = records.len();
        report.advance(PipelineState::Parsed { records: records.len() });

        if records.is_empty() {
            self.audit.warning("CSV file is empty or invalid", file_details()).await;
            report.advance(PipelineState::Completed { records: 0 });
            report.elapsed_time = start_time.elapsed();
            return Ok(report);
        }

        self.audit.info(format!("Parsed {} records from CSV", records.len()), file_details()).await;

        let total_records = records.len();
        let chunks = chunk_records(records, self.config.chunk_size())?;
        report.chunks_total = chunks.len();
        report.advance(PipelineState::Chunked { chunks: chunks.len() });
        tracing::info!("Split into {} chunks (chunk size {})", chunks.len(), self.config.chunk_size());

        for chunk in chunks {
            let (ordinal, total) = (chunk.ordinal, chunk.total);
            report.advance(PipelineState::Loading { chunk: ordinal, total });

            match self.loader.load(chunk).await {
                Ok(inserted) => {
                    report.chunks_committed += 1;
                    report.rows_committed += inserted;
                    tracing::info!("Processed chunk {}/{}", ordinal, total);
                }
                Err(e) => {
                    report.advance(PipelineState::Failed { chunk: ordinal, total });
                    self.audit.error(format!("Error processing chunk {}/{}", ordinal, total), Some(e.cause.to_string())).await;
                    self.audit.error("CSV processing failed", Some(e.to_string())).await;
                    tracing::error!(
                        "Error processing CSV {} after {} committed chunks: {}",
                        event.name,
                        report.chunks_committed,
                        e
                    );
                    return Err(e.into());
                }
            }
        }

        self.audit.info("CSV processing completed successfully", Some(format!("Total records: {}", total_records))).await;
        report.advance(PipelineState::Completed { records: total_records });
        report.elapsed_time = start_time.elapsed();

        Ok(report)
    }

    /// Run the schema pass; a failure is logged and the run continues
    async fn initialize_schema(&self) {
        match self.warehouse.ensure_schema().await {
            Ok(schema) => {
                tracing::debug!(
                    created_data_table = schema.created_data_table,
                    created_log_table = schema.created_log_table,
                    "Schema ready"
                );
            }
            Err(e) => tracing::error!("Error initializing database: {}", e),
        }
    }
}
