//! Logging initialization (§10.1): `tracing-subscriber`, `EnvFilter` driven
//! by `RUST_LOG` falling back to a configured default level, `pretty` or
//! `json` output selected by `--log-format` / `logging.format`.

use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::LogFormat;

/// Initializes the global `tracing` subscriber. Must be called once, before
/// any node executes, since every node execution emits an
/// `info_span!("node", ...)` that needs a subscriber installed to go
/// anywhere.
pub fn init_logging(default_level: &str, format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Json => subscriber.json().init(),
    }
}
