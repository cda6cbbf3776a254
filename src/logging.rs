//! Tracing subscriber setup.
//!
//! Log lines go to stderr: stdout carries the tool protocol and JSON output.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count
#[must_use]
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info,roster=debug",
        _ => "trace",
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbose`.
/// Calling this twice leaves the first subscriber in place.
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
