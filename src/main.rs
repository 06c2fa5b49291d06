/// CSV Blob Loader
///
/// An ingestion pipeline that loads CSV files dropped into storage into
/// PostgreSQL in transactional chunks, recording progress in an audit log.
mod audit;
mod cli;
mod config;
mod db;
mod error;
mod etl;
mod models;
mod pipeline;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use config::IngestConfig;
use db::{queries, Database};
use pipeline::{Pipeline, RunReport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storage::{BlobWatcher, LocalContainer};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    cli.validate()?;

    let config = IngestConfig::from_env(cli.connection.database_url.as_deref(), cli.connection.chunk_size)
        .context("Invalid configuration. Please check your .env file")?;
    let database = Arc::new(Database::new(config.database.clone()));
    database.test_connection().await?;

    match cli.command {
        Command::Ingest { files } => ingest_files(database, &config, &files).await,
        Command::Watch { dir, interval, skip_existing } => {
            watch_directory(database, &config, dir, Duration::from_secs(interval), skip_existing).await
        }
        Command::Logs { limit, json } => show_logs(&database, limit, json).await,
        Command::Rows { limit } => show_rows(&database, limit).await,
    }
}

/// Trigger one pipeline run per file, stopping at the first failure
async fn ingest_files(database: Arc<Database>, config: &IngestConfig, files: &[PathBuf]) -> Result<()> {
    let pipeline = Pipeline::new(database, config.pipeline);

    for path in files {
        let event = storage::read_blob(path).await?;
        let report = pipeline.run(&event).await.context(format!("Failed to process {}", path.display()))?;
        print_report(&report);
    }

    Ok(())
}

/// Poll a directory and trigger a run for each new file
///
/// A failed run is reported and the watcher keeps going.
async fn watch_directory(
    database: Arc<Database>,
    config: &IngestConfig,
    dir: PathBuf,
    interval: Duration,
    skip_existing: bool,
) -> Result<()> {
    let pipeline = Pipeline::new(database, config.pipeline);
    let container = LocalContainer::new(dir);
    println!("👀 Watching {} every {}s", container.root().display(), interval.as_secs());

    let mut watcher = BlobWatcher::new(container);
    if skip_existing {
        let skipped = watcher.skip_existing().await?;
        tracing::info!("Skipping {} existing files", skipped);
    }

    loop {
        for event in watcher.poll().await? {
            match pipeline.run(&event).await {
                Ok(report) => print_report(&report),
                Err(e) => println!("❌ {}: {}", event.name, e),
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n👋 Stopping watcher");
                return Ok(());
            }
        }
    }
}

async fn show_logs(database: &Database, limit: Option<i64>, json: bool) -> Result<()> {
    let mut conn = database.connect().await.context("Failed to connect to PostgreSQL database")?;
    let entries = queries::list_log_entries(&mut conn, limit)
        .await
        .context("Failed to fetch process logs. Check that the process_logs table exists")?;
    db::close_quietly(conn).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in entries {
        println!(
            "{} [{:<7}] {}{}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            entry.level,
            entry.message,
            entry.details.map(|d| format!(" ({})", d)).unwrap_or_default()
        );
    }

    Ok(())
}

async fn show_rows(database: &Database, limit: Option<i64>) -> Result<()> {
    let mut conn = database.connect().await.context("Failed to connect to PostgreSQL database")?;
    let rows = queries::list_rows(&mut conn, limit)
        .await
        .context("Failed to fetch rows. Check that the transport_data table exists")?;
    let total = queries::count_rows(&mut conn).await.context("Failed to count rows")?;
    db::close_quietly(conn).await;

    for row in &rows {
        println!(
            "{:>8}  {:<24} {:<32} {:>3}  {:<16} {:>12}  {}",
            row.id,
            row.name,
            row.email,
            row.age,
            row.city,
            row.salary,
            row.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("📦 Showing {} of {} rows", format_number(rows.len() as u64), format_number(total as u64));

    Ok(())
}

fn print_report(report: &RunReport) {
    if report.is_empty() {
        println!("⚠️  {}: no data rows", report.file);
        return;
    }

    println!(
        "✅ {}: {} records in {} chunks ({:.2}s)",
        report.file,
        format_number(report.rows_committed as u64),
        report.chunks_committed,
        report.elapsed_time.as_secs_f64()
    );
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
