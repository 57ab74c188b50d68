//! trackmap - long-running input track accumulation.
//!
//! Pointer and thumbstick positions are accumulated into per-profile,
//! per-resolution counter arrays, which can be rendered on demand into
//! colour-mapped images.

pub mod capture;
pub mod cli;
pub mod commands;
pub mod config;
pub mod processing;
pub mod recorder;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use recorder::error::{TrackError, TrackResult};
pub use recorder::Tracker;

/// Initialize tracing/logging for the binary
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "trackmap=debug,trackmap_lib=debug"
    } else {
        "trackmap=info,trackmap_lib=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
