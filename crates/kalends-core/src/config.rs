//! Process settings.
//!
//! Sources are layered as built-in defaults, then the environment
//! (`DATABASE_URL`, `LOGGING_LEVEL`, ...), then an
//! optional `config.toml` in the working directory.

use config::{Case, Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::error::CoreResult;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `kalends_db=debug`.
    pub level: String,
}

fn with_defaults() -> CoreResult<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("database.max_connections", 4)?
        .set_default("logging.level", "info")?)
}

impl Settings {
    /// ## Summary
    /// Builds `Settings` from defaults, the process environment and `config.toml`.
    ///
    /// ## Errors
    /// Returns [`CoreError::Settings`](crate::error::CoreError::Settings) when a
    /// source is malformed or a required key such as `database.url` is missing.
    pub fn load() -> CoreResult<Self> {
        let settings = with_defaults()?
            .add_source(
                Environment::default()
                    .convert_case(Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

/// ## Summary
/// Reads `.env` into the environment, then loads [`Settings`].
///
/// ## Errors
/// Returns an error if the settings cannot be built.
pub fn load_config() -> CoreResult<Settings> {
    if let Err(err) = dotenvy::dotenv() {
        tracing::trace!(error = %err, "No .env file loaded");
    }

    let settings = Settings::load()?;
    tracing::debug!(
        max_connections = settings.database.max_connections,
        log_level = %settings.logging.level,
        "Settings loaded"
    );
    Ok(settings)
}
