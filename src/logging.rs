//! Tracing subscriber setup for the `lexamb` binary.

use tracing_subscriber::{EnvFilter, fmt};

/// Install a stderr `fmt` subscriber filtered by `directives`.
///
/// `directives` uses `RUST_LOG` syntax (for example `"info"` or
/// `"lexical_ambiguity=debug"`); an unparsable value falls back to `warn`.
/// Returns false when a global subscriber was already installed.
pub fn init_tracing(directives: &str) -> bool {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
