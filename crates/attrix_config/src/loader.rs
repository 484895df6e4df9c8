//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::AttrixConfig;
use std::collections::HashSet;
use std::path::Path;

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "attrix.toml";

/// Loads and validates an `attrix.toml` configuration from a project directory.
///
/// Reads `<project_dir>/attrix.toml`, parses it, and validates its values.
pub fn load_config(project_dir: &Path) -> Result<AttrixConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Like [`load_config`], but returns the default configuration when the
/// project has no `attrix.toml`.
pub fn load_config_or_default(project_dir: &Path) -> Result<AttrixConfig, ConfigError> {
    if project_dir.join(CONFIG_FILE_NAME).is_file() {
        load_config(project_dir)
    } else {
        Ok(AttrixConfig::default())
    }
}

/// Parses and validates an `attrix.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<AttrixConfig, ConfigError> {
    let config: AttrixConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required values are present and consistent.
fn validate_config(config: &AttrixConfig) -> Result<(), ConfigError> {
    if config.scanner.paths.iter().all(|p| p.trim().is_empty()) {
        return Err(ConfigError::MissingField("scanner.paths".to_string()));
    }
    if config.scanner.max_file_size == 0 {
        return Err(ConfigError::ValidationError(
            "scanner.max_file_size must be greater than zero".to_string(),
        ));
    }
    if config.cache.path.trim().is_empty() {
        return Err(ConfigError::MissingField("cache.path".to_string()));
    }
    let mut seen = HashSet::new();
    for plugin in &config.plugins {
        if plugin.name.is_empty() {
            return Err(ConfigError::MissingField("plugins.name".to_string()));
        }
        if plugin.path.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "plugins.path (plugin '{}')",
                plugin.name
            )));
        }
        if !seen.insert(plugin.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate plugin '{}'",
                plugin.name
            )));
        }
    }
    Ok(())
}
