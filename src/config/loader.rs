//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::DeployConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DeployConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<DeployConfig, ConfigError> {
    let config: DeployConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read and parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<DeployConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load from `path` when given, else start from the defaults.
///
/// Nothing is validated here; callers validate after applying
/// command-line overrides.
pub fn load_or_default(path: Option<&Path>) -> Result<DeployConfig, ConfigError> {
    match path {
        Some(path) => {
            let config = read_config(path)?;
            tracing::debug!(path = %path.display(), "Configuration loaded from file");
            Ok(config)
        }
        None => Ok(DeployConfig::default()),
    }
}
