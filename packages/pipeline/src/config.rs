//! Run configuration loading.

use std::path::Path;

use osm_sites_pipeline_models::RunConfig;

/// Errors loading or validating a [`RunConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Loads a [`RunConfig`] from `path`, or the defaults when `path` is
/// `None`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, is not valid TOML,
/// or fails [`validate`].
pub fn load(path: Option<&Path>) -> Result<RunConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            log::debug!("Loading run config from {}", path.display());
            parse(&std::fs::read_to_string(path)?)?
        }
        None => RunConfig::default(),
    };
    validate(&config)?;
    Ok(config)
}

/// Parses a [`RunConfig`] from TOML text. Missing fields take defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Toml`] on malformed input.
pub fn parse(text: &str) -> Result<RunConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Rejects settings that would make a run meaningless.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for a non-positive tile size, zero
/// workers, a zero timeout or zero geocoding attempts.
pub fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    let invalid = |message: &str| {
        Err(ConfigError::Invalid {
            message: message.to_string(),
        })
    };

    if !config.tile_size_deg.is_finite() || config.tile_size_deg <= 0.0 {
        return invalid("tile_size_deg must be a positive number");
    }
    if config.max_workers == 0 {
        return invalid("max_workers must be at least 1");
    }
    if config.timeout_secs == 0 {
        return invalid("timeout_secs must be at least 1");
    }
    if config.geocode_max_tries == 0 {
        return invalid("geocode_max_tries must be at least 1");
    }
    Ok(())
}
