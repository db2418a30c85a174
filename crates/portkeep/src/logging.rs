//! Log initialization for binaries embedding a keeper.

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` controls verbosity and defaults to `info`. Calling this more
/// than once is harmless: later calls lose the set-global race and are
/// ignored, so tests and embedders can both call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
