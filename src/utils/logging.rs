// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the tracing subscriber for the whole process.
/// Log level filters come from the `RUST_LOG` environment variable,
/// defaulting to "info" when unset.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).init();

    tracing::debug!("Logging setup complete.");
}
