//! Tracing/logging bootstrap.
//!
//! Grounded in the teacher's `telemetry.rs` fallback branch: a
//! `tracing_subscriber::fmt` layer filtered by `EnvFilter` against
//! `RUST_LOG`, defaulting to `info` when unset. The teacher's OTLP export
//! layers (`opentelemetry-otlp`, periodic metric/span push,
//! `tracing-opentelemetry`) are dropped — this crate carries no standing
//! use for push-based metrics export, and none of those crates are in
//! `Cargo.toml` (see `DESIGN.md`). A binary embedding this crate that wants
//! OTLP export is free to layer it on top of the subscriber this sets up.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global `tracing` subscriber.
///
/// Reads `RUST_LOG` for the filter directive (e.g. `txrelay=debug,info`),
/// defaulting to `info` when the variable is unset or unparsable. Safe to
/// call once per process; a second call panics, matching
/// `tracing_subscriber`'s own global-subscriber contract.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_falls_back_to_info_without_panicking() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        assert!(!format!("{filter:?}").is_empty());
    }
}
