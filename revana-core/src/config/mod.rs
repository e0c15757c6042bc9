//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub drivers: DriversConfig,
    pub logging: LoggingConfig,
}

/// Limits and scheduling knobs for the analysis engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum analyzer subprocesses in flight per job
    pub max_concurrent_batches: usize,
    /// Maximum number of files accepted per job
    pub max_files: usize,
    /// Grace window between SIGTERM and SIGKILL when aborting a subprocess (seconds)
    pub termination_grace_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrent_batches: 2,
            max_files: 10_000,
            termination_grace_secs: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn termination_grace(&self) -> Duration {
        Duration::from_secs(self.termination_grace_secs)
    }
}

/// Per-driver subprocess settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Executable name or explicit path
    pub executable: String,
    /// Deadline for a single batch invocation (seconds)
    pub timeout_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            executable: String::new(),
            timeout_secs: 60,
        }
    }
}

impl DriverConfig {
    fn new(executable: &str, timeout_secs: u64) -> Self {
        Self {
            executable: executable.to_string(),
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the external analyzer tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriversConfig {
    pub eslint: DriverConfig,
    pub bandit: DriverConfig,
    pub semgrep: DriverConfig,
}

impl Default for DriversConfig {
    fn default() -> Self {
        Self {
            // ESLint is invoked through npx so no global install is required
            eslint: DriverConfig::new("npx", 30),
            bandit: DriverConfig::new("bandit", 10),
            semgrep: DriverConfig::new("semgrep", 300),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (`trace`, `debug`, `info`, `warn`, `error`) or a full
    /// `EnvFilter` directive string
    pub level: String,
    /// Output format: `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.analysis.validate()?;
        self.drivers.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl Validate for AnalysisConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent_batches == 0 {
            return Err(ValidationError::analysis(
                "max_concurrent_batches must be > 0",
            ));
        }
        if self.max_files == 0 {
            return Err(ValidationError::analysis("max_files must be > 0"));
        }
        Ok(())
    }
}

impl Validate for DriversConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (name, driver) in [
            ("eslint", &self.eslint),
            ("bandit", &self.bandit),
            ("semgrep", &self.semgrep),
        ] {
            if driver.executable.is_empty() {
                return Err(ValidationError::driver(format!(
                    "{name}: executable must not be empty"
                )));
            }
            if driver.timeout_secs == 0 {
                return Err(ValidationError::driver(format!(
                    "{name}: timeout_secs must be > 0"
                )));
            }
        }
        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "unknown log format '{other}' (expected 'pretty' or 'json')"
            ))),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Add local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("REVANA").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
