// src/main.rs
mod ctc;
mod export;
mod server;
mod storage;
mod utils;

use clap::Parser;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::StorageManager;
use utils::AppError;

const DEFAULT_PORT: u16 = 10000;

/// Command Line Interface for the CTC record extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a text file with the certificate content (stdin when omitted)
    input: Option<PathBuf>,

    /// Output directory for the one-shot spreadsheet export
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Run the HTTP extraction service instead of a one-shot extraction
    #[arg(long)]
    serve: bool,

    /// Port for the HTTP service (falls back to the PORT environment
    /// variable, then 10000)
    #[arg(long)]
    port: Option<u16>,

    /// Directory where the HTTP service stores downloadable artifacts
    /// (defaults to a ctc_exports directory under the system temp dir)
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Age in hours after which stored artifacts are deleted at server
    /// startup
    #[arg(long, default_value = "24")]
    max_artifact_age_hours: i64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting with args: {:?}", args);

    // 3. Server mode: clean up stale artifacts, then serve until shutdown
    if args.serve {
        let artifact_dir = args
            .artifact_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("ctc_exports"));
        let storage = StorageManager::new(&artifact_dir)?;

        match storage.cleanup_expired(args.max_artifact_age_hours) {
            Ok(0) => tracing::debug!("No expired export artifacts to clean up"),
            Ok(count) => tracing::info!("Cleaned up {} expired export artifact(s)", count),
            Err(e) => tracing::warn!("Artifact cleanup failed: {}", e),
        }

        return server::run(resolve_port(args.port)?, Arc::new(storage)).await;
    }

    // 4. One-shot mode: read, extract, export
    let text = read_document(args.input.as_deref())?;
    tracing::info!("Read input document ({} characters)", text.chars().count());

    let records = ctc::extract_records(&text)?;
    tracing::info!("Extracted {} record(s)", records.len());

    fs::create_dir_all(&args.output_dir)?;
    let out_path = Path::new(&args.output_dir).join(export::DOWNLOAD_NAME);
    export::write_workbook(&records, &out_path)?;

    tracing::info!(
        "Wrote {} record(s) to {}",
        records.len(),
        out_path.display()
    );

    Ok(())
}

/// Reads the whole document from a file, or from stdin when no path was
/// given.
fn read_document(input: Option<&Path>) -> Result<String, AppError> {
    match input {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// CLI flag wins; otherwise the PORT environment variable, then the default.
fn resolve_port(flag: Option<u16>) -> Result<u16, AppError> {
    if let Some(port) = flag {
        return Ok(port);
    }

    match std::env::var("PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .map_err(|_| AppError::Config(format!("Invalid PORT value: {}", raw))),
        Err(_) => Ok(DEFAULT_PORT),
    }
}
