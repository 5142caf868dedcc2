//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server binding and CORS origins
//! - `sms` - SMS provider selection and credentials
//! - `store` - Verification record storage backend
//! - `verification` - Code lifetime and diagnostics policy
//!
//! Values are layered with the `config` crate: built-in defaults for the
//! detected environment, then an optional `config.<env>.toml` file, then
//! `PV__<SECTION>__<KEY>` environment variables.

pub mod environment;
pub mod server;
pub mod sms;
pub mod store;
pub mod verification;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// Re-export commonly used types
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use sms::{SmsConfig, SmsProvider};
pub use store::{StoreBackend, StoreConfig};
pub use verification::VerificationConfig;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "PV";

/// Separator between nested keys in environment variable overrides
pub const ENV_SEPARATOR: &str = "__";

/// Longest code lifetime accepted from configuration (one day)
pub const MAX_CODE_TTL_MINUTES: i64 = 24 * 60;

/// Longest retention of expired records accepted from configuration (one day)
pub const MAX_SWEEP_GRACE_SECS: i64 = 24 * 60 * 60;

/// Errors raised while assembling the application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Verification policy
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Code store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// SMS gateway
    #[serde(default)]
    pub sms: SmsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AppConfig {
    /// Built-in defaults for an environment
    pub fn for_environment(environment: Environment) -> Self {
        let server = match environment {
            Environment::Production => ServerConfig::new("0.0.0.0", 8080),
            _ => ServerConfig::default(),
        };

        Self {
            environment,
            server,
            verification: VerificationConfig::default(),
            store: StoreConfig::default(),
            sms: SmsConfig::default(),
            logging: LoggingConfig::for_environment(environment),
        }
    }

    /// Load configuration for the environment named by `ENVIRONMENT`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_for(Environment::from_env())
    }

    /// Load configuration for an explicit environment
    pub fn load_for(environment: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::for_environment(environment);

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::from(Path::new(environment.config_file())).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;
        app_config.environment = environment;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Check cross-field constraints and apply environment guards
    ///
    /// Diagnostics mode is switched off in production regardless of what the
    /// configuration sources asked for.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.verification.code_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid(format!(
                "verification.code_ttl_minutes must be positive, got {}",
                self.verification.code_ttl_minutes
            )));
        }

        if self.verification.code_ttl_minutes > MAX_CODE_TTL_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "verification.code_ttl_minutes must be at most {}, got {}",
                MAX_CODE_TTL_MINUTES, self.verification.code_ttl_minutes
            )));
        }

        if self.verification.sweep_grace_secs < 0 {
            return Err(ConfigError::Invalid(
                "verification.sweep_grace_secs must not be negative".to_string(),
            ));
        }

        if self.verification.sweep_grace_secs > MAX_SWEEP_GRACE_SECS {
            return Err(ConfigError::Invalid(format!(
                "verification.sweep_grace_secs must be at most {}, got {}",
                MAX_SWEEP_GRACE_SECS, self.verification.sweep_grace_secs
            )));
        }

        if self.environment.is_production() && self.verification.diagnostics_mode {
            tracing::warn!(
                event = "diagnostics_mode_rejected",
                "Diagnostics mode requested in production; forcing it off"
            );
            self.verification.diagnostics_mode = false;
        }

        if self.sms.provider == SmsProvider::Twilio {
            if self.sms.account_sid.is_empty() || self.sms.auth_token.is_empty() {
                return Err(ConfigError::Invalid(
                    "sms.account_sid and sms.auth_token are required for the twilio provider".to_string(),
                ));
            }
            if !self.sms.from_number.starts_with('+') {
                return Err(ConfigError::Invalid(
                    "sms.from_number must be in E.164 format (starting with '+')".to_string(),
                ));
            }
        }

        Ok(())
    }
}
