//! perfwatch: frame-rate and memory telemetry harness.
//!
//! Drives a simulated render loop and logs the monitor's view of it.
//! Run with:  `RUST_LOG=info perfwatch`

mod harness;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("perfwatch v{} starting", env!("CARGO_PKG_VERSION"));

    harness::run().await
}
