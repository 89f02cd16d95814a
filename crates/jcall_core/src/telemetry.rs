//! Tracing subscriber setup for applications using jcall.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize human-readable logging.
///
/// Installs a `tracing` subscriber with a fmt layer filtered by `RUST_LOG`.
/// The library itself never installs a subscriber; binaries and tests opt in.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    Ok(())
}

/// Initialize JSON logging, one object per event.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing_json() -> Result<(), Box<dyn std::error::Error>> {
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry().with(json_layer).try_init()?;

    Ok(())
}
