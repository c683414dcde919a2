//! Application configuration module
//!
//! Configuration is read from environment variables with the
//! `DECISION_COPILOT` prefix, nested values separated by `__`. A `.env` file
//! in the working directory is loaded first when present.
//!
//! # Example
//!
//! ```no_run
//! use decision_copilot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod logging;
mod store;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields an in-memory
/// store with human-readable logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Store backend and change notification settings
    #[serde(default)]
    pub store: StoreConfig,

    /// PostgreSQL connection, required for the `postgres` backend
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `DECISION_COPILOT__STORE__BACKEND=postgres` -> `store.backend`
    /// - `DECISION_COPILOT__DATABASE__URL=...` -> `database.url`
    /// - `DECISION_COPILOT__LOGGING__JSON=true` -> `logging.json`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DECISION_COPILOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid, or
    /// if the `postgres` backend is selected without a database section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.logging.validate()?;
        match (self.store.backend, &self.database) {
            (StoreBackend::Postgres, None) => {
                Err(ValidationError::MissingRequired("DATABASE__URL"))
            }
            (StoreBackend::Postgres, Some(database)) => database.validate(),
            (StoreBackend::Memory, _) => Ok(()),
        }
    }
}
