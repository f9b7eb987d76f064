//! Process-level engine configuration (§10.3): default retry parameters,
//! default `apiEnrich` HTTP timeout, default log level/format, default
//! ledger connection string. Distinct from a pipeline description (always
//! JSON, always passed explicitly) and a folder configuration (owned by the
//! external metadata store) - this is only the engine's own defaults.
//!
//! Layered via the `config` crate: built-in defaults, then an optional file
//! (TOML by default; YAML/JSON accepted by extension), then environment
//! variables prefixed `PIPELINE_FLOW__`, then explicit CLI overrides applied
//! last by the caller.

use serde::{Deserialize, Serialize};

use pipeline_flow_domain::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Pretty
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "EngineConfig::default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "EngineConfig::default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    #[serde(default = "EngineConfig::default_retry_multiplier")]
    pub retry_multiplier: u32,
    #[serde(default = "EngineConfig::default_api_enrich_timeout_secs")]
    pub api_enrich_timeout_secs: u64,
    #[serde(default = "EngineConfig::default_ledger_url")]
    pub ledger_url: String,
    /// SMTP relay host for the `email` send backend (§4.5). Empty disables
    /// the backend at startup rather than failing every send attempt.
    #[serde(default)]
    pub smtp_relay_host: String,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default = "EngineConfig::default_smtp_from_address")]
    pub smtp_from_address: String,
}

impl EngineConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
    fn default_retry_max_attempts() -> u32 {
        3
    }
    fn default_retry_initial_delay_ms() -> u64 {
        1_000
    }
    fn default_retry_multiplier() -> u32 {
        2
    }
    fn default_api_enrich_timeout_secs() -> u64 {
        30
    }
    fn default_ledger_url() -> String {
        "sqlite://pipeline-flow-ledger.db".to_string()
    }
    fn default_smtp_from_address() -> String {
        "pipeline-flow@localhost".to_string()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            log_format: LogFormat::default(),
            retry_max_attempts: Self::default_retry_max_attempts(),
            retry_initial_delay_ms: Self::default_retry_initial_delay_ms(),
            retry_multiplier: Self::default_retry_multiplier(),
            api_enrich_timeout_secs: Self::default_api_enrich_timeout_secs(),
            ledger_url: Self::default_ledger_url(),
            smtp_relay_host: String::new(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from_address: Self::default_smtp_from_address(),
        }
    }
}

/// Loads configuration, layering: built-in defaults < `config_path` (if it
/// exists) < environment variables prefixed `PIPELINE_FLOW` (double
/// underscore as the key separator, e.g. `PIPELINE_FLOW__RETRY_MAX_ATTEMPTS`).
/// CLI-flag overrides are applied by the caller on the returned value, since
/// they come from already-parsed `clap` arguments rather than this crate's
/// source chain.
pub fn load_config(config_path: Option<&str>) -> Result<EngineConfig, PipelineError> {
    let mut builder = config::Config::builder().add_source(config::Config::try_from(&EngineConfig::default()).map_err(config_error)?);

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::with_name(path).required(false));
    }

    builder = builder.add_source(config::Environment::with_prefix("PIPELINE_FLOW").separator("__"));

    let config = builder.build().map_err(config_error)?;
    config.try_deserialize().map_err(config_error)
}

fn config_error(error: config::ConfigError) -> PipelineError {
    PipelineError::invalid_config(format!("configuration error: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_no_file_or_env() {
        let config = load_config(Some("/nonexistent/path/that/does/not/exist")).unwrap();
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.ledger_url, "sqlite://pipeline-flow-ledger.db");
    }
}
