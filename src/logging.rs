//! Diagnostic tracing for gwt.
//!
//! Traces go to stderr so stdout stays reserved for paths and data. The
//! filter comes from `GWT_LOG` (standard `EnvFilter` syntax); without it the
//! level is `warn`, or `debug` when `--debug` is passed.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the trace filter directive.
pub const LOG_ENV: &str = "GWT_LOG";

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}
