//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr through `tracing`; stdout is reserved for
//! answers and other command output so it stays pipeable. The filter comes
//! from `RUST_LOG` and defaults to `docqa=info`, or `docqa=debug` with
//! `--verbose`.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose { "docqa=debug" } else { "docqa=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Already initialised when called twice in one process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
