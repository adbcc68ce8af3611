//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter directives for `level`: everything else stays at `warn`.
fn directives(level: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { level };
    format!("warn,oil_price_sensor={level}")
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for `--json` results. `RUST_LOG` overrides the computed filter.
pub fn init(level: &str, verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(level, verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (tests, embedding) is not an error.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
