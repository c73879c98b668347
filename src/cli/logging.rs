//! Log output for the CLI using tracing_subscriber.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Log level directive for this crate, e.g. `debug` (default `info`).
pub const LOG_ENV_VAR: &str = "AVRO_TO_PG_LOG";

const CRATE_NAME: &str = "avro_to_postgres";

/// Initializes a tracing subscriber writing to stderr.
///
/// `RUST_LOG` directives apply to all crates; `AVRO_TO_PG_LOG` sets the level
/// of this crate unless `RUST_LOG` already names it. `verbose` raises the
/// default to `debug`.
pub fn init(verbose: bool) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, log_level) = env_filter_and_log_level(verbose);

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {}", log_level);
    });
}

fn env_filter_and_log_level(verbose: bool) -> (EnvFilter, String) {
    let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(&directive_string);

    let default_level = if verbose { "debug" } else { "info" };
    let log_level = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| default_level.to_string());

    if !directive_string.contains(&format!("{CRATE_NAME}=")) {
        match format!("{CRATE_NAME}={log_level}").parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring invalid {}={}: {}", LOG_ENV_VAR, log_level, e),
        }
    }

    (env_filter, log_level)
}
