//! Logging and tracing configuration for the hex viewer core
//!
//! Structured logging through the `tracing` crate. Chunk traffic is logged at
//! `trace`, dispatch and eviction at `debug`, session open/close at `info`,
//! and failed reads at `warn`.
//!
//! # Environment Variable Control
//!
//! ```bash
//! RUST_LOG=debug ffx-hexview image.dd                   # All debug logs
//! RUST_LOG=ffx_hexview::viewer=trace ffx-hexview img.dd # Chunk-level detail
//! RUST_LOG=warn ffx-hexview image.dd                    # Only read failures
//! ```

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn default_filter() -> EnvFilter {
    if cfg!(feature = "debug-logging") {
        EnvFilter::new("ffx_hexview=trace")
    } else if cfg!(debug_assertions) {
        EnvFilter::new("ffx_hexview=debug")
    } else {
        EnvFilter::new("ffx_hexview=info")
    }
}

/// Initialize the logging/tracing system; call once at startup.
/// A second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact(),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Verbose variant with file:line and thread ids, handy for watching the
/// reader pool
pub fn init_verbose() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .pretty(),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[inline]
pub fn is_trace_enabled() -> bool {
    tracing::enabled!(Level::TRACE)
}
