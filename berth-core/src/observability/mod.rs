//! Observability infrastructure: tracing and health checks.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod health;

/// Initialize the global tracing subscriber.
///
/// `default_level` is used unless `RUST_LOG` is set. Calling this more than
/// once returns an error instead of replacing the subscriber.
pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .try_init()?;

    tracing::debug!(default_level, "Tracing initialized");
    Ok(())
}

/// Initialize a quiet subscriber for command-line tools.
///
/// Only warnings reach stderr so command output stays clean.
pub fn init_cli() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
