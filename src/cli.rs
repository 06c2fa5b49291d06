/// CLI Module
///
/// Command-line interface configuration using clap.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CSV Blob Loader - chunked, transactional CSV ingestion
///
/// Load CSV files dropped into storage into PostgreSQL, with an audit log
#[derive(Parser, Debug)]
#[command(name = "csv-blob-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Database connection URL (overrides DATABASE_URL and PG* env vars)
    #[arg(short = 'd', long, value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Records per transactional chunk (overrides CHUNK_SIZE env var, default 100)
    #[arg(short = 'b', long, value_name = "SIZE", global = true)]
    pub chunk_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the pipeline once per file, in order, stopping at the first failure
    Ingest {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Watch a directory and run the pipeline for every new file
    Watch {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Interval between directory polls in seconds
        #[arg(long, value_name = "SECONDS", default_value = "10")]
        interval: u64,

        /// Ignore files already present when the watcher starts
        #[arg(long)]
        skip_existing: bool,
    },

    /// Show audit log entries, newest first
    Logs {
        #[arg(short = 'n', long, value_name = "COUNT")]
        limit: Option<i64>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show loaded rows ordered by id
    Rows {
        #[arg(short = 'n', long, value_name = "COUNT")]
        limit: Option<i64>,
    },
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.connection.chunk_size == Some(0) {
            anyhow::bail!("Chunk size must be greater than 0");
        }

        match &self.command {
            Command::Watch { interval: 0, .. } => anyhow::bail!("Watch interval must be greater than 0"),
            Command::Logs { limit: Some(n), .. } | Command::Rows { limit: Some(n) } if *n < 0 => {
                anyhow::bail!("Limit must not be negative")
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_from(["csv-blob-loader", "ingest", "a.csv", "b.csv", "--chunk-size", "50"]).unwrap();

        assert_eq!(cli.connection.chunk_size, Some(50));
        match &cli.command {
            Command::Ingest { files } => assert_eq!(files, &vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_ingest_requires_a_file() {
        assert!(Cli::try_parse_from(["csv-blob-loader", "ingest"]).is_err());
    }

    #[test]
    fn test_watch_defaults() {
        let cli = Cli::try_parse_from(["csv-blob-loader", "watch", "uploads"]).unwrap();

        match cli.command {
            Command::Watch { dir, interval, skip_existing } => {
                assert_eq!(dir, PathBuf::from("uploads"));
                assert_eq!(interval, 10);
                assert!(!skip_existing);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation() {
        let cli = Cli::try_parse_from(["csv-blob-loader", "-b", "0", "ingest", "a.csv"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["csv-blob-loader", "watch", "uploads", "--interval", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
