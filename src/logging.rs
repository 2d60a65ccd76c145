//! Logging setup.
//!
//! Diagnostics go to stderr so command output on stdout stays clean.
//! `RUST_LOG` takes precedence over the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level (count of `-v` flags).
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "skillmaster=warn",
        1 => "skillmaster=info",
        2 => "skillmaster=debug",
        _ => "skillmaster=trace,reqwest=debug",
    }
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
