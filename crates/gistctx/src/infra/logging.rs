//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GISTCTX_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Install a stderr formatter filtered by `GISTCTX_LOG` (e.g. `gistctx=debug`).
///
/// `verbose` raises the fallback level to `debug` when the variable is unset. Calling this more
/// than once is harmless.
pub fn init(verbose: bool) {
    let fallback = if verbose { "gistctx=debug" } else { DEFAULT_DIRECTIVE };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
