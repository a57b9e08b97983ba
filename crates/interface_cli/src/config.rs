//! Host configuration
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. `premium-rater.toml` in the working directory, if present
//! 3. `RATER__<KEY>` environment variables (a `.env` file is loaded first)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

use core_kernel::CoreError;
use domain_issuance::{DEFAULT_CHECK_TIMEOUT, DEFAULT_MAX_ATTEMPTS};

/// Name of the optional configuration file, without extension
pub const CONFIG_FILE: &str = "premium-rater";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "RATER";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Host configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RaterConfig {
    /// Rate table document
    pub tables_path: PathBuf,
    /// Policy-number prefix
    #[validate(length(min = 1, max = 8))]
    pub policy_prefix: String,
    /// Identifier attempts before giving up
    #[validate(range(min = 1, max = 100))]
    pub max_attempts: u32,
    /// Timeout for one existence check, in milliseconds
    #[validate(range(min = 1, max = 60000))]
    pub check_timeout_ms: u64,
    /// Default log filter when `RUST_LOG` is unset
    #[validate(length(min = 1))]
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for RaterConfig {
    fn default() -> Self {
        Self {
            tables_path: PathBuf::from("config/rate-tables.json"),
            policy_prefix: core_kernel::DEFAULT_POLICY_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            check_timeout_ms: DEFAULT_CHECK_TIMEOUT.as_millis() as u64,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl RaterConfig {
    /// Loads configuration from the working directory and environment
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads configuration with `file` as the optional file layer
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if a source cannot be read or a
    /// value is out of range.
    pub fn load_from(file: &Path) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let config: Self = config::Config::builder()
            .set_default("tables_path", defaults.tables_path.to_string_lossy().into_owned())
            .and_then(|b| b.set_default("policy_prefix", defaults.policy_prefix))
            .and_then(|b| b.set_default("max_attempts", i64::from(defaults.max_attempts)))
            .and_then(|b| b.set_default("check_timeout_ms", defaults.check_timeout_ms as i64))
            .and_then(|b| b.set_default("log_level", defaults.log_level))
            .and_then(|b| b.set_default("log_format", "text"))
            .map_err(configuration)?
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(configuration)?;

        config
            .validate()
            .map_err(|e| CoreError::configuration(e.to_string()))?;
        core_kernel::identifiers::validate_prefix(&config.policy_prefix)?;
        Ok(config)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

fn configuration(err: config::ConfigError) -> CoreError {
    CoreError::configuration(err.to_string())
}
