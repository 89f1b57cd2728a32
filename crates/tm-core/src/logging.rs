//! Logging setup.
//!
//! All log output goes to stderr; stdout stays reserved for artifact
//! payloads. `RUST_LOG` overrides the verbosity flags when set.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber once at startup.
///
/// `verbose` counts `-v` occurrences; `quiet` drops everything below warn.
pub fn init(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tm_core={default_level},tm_corpus={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
