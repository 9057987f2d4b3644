//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber; `RUST_LOG` wins over `verbose`
pub(crate) fn init(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // a second init (e.g. in tests) is not an error worth surfacing
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
