//! Configuration loading
//!
//! Reads the TOML file, substitutes `${VAR}` environment references, parses
//! and validates. Substitution happens on the raw text so credentials can be
//! kept out of the file entirely.

use crate::config::schema::FuripsConfig;
use crate::domain::{ExportError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Load and validate configuration from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<FuripsConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExportError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let config: FuripsConfig = toml::from_str(&contents)
        .map_err(|e| ExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    config
        .validate()
        .map_err(|e| ExportError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Replace `${VAR_NAME}` references with environment values.
///
/// An unset variable is an error, never an empty-string fallback.
fn substitute_env_vars(contents: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ExportError::Configuration(format!("Invalid substitution pattern: {e}")))?;

    let mut result = String::with_capacity(contents.len());
    let mut last_end = 0;
    for captures in pattern.captures_iter(contents) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let name = &captures[1];
        let value = std::env::var(name).map_err(|_| {
            ExportError::Configuration(format!(
                "Environment variable '{name}' referenced in configuration is not set"
            ))
        })?;
        result.push_str(&contents[last_end..whole.start()]);
        result.push_str(&value);
        last_end = whole.end();
    }
    result.push_str(&contents[last_end..]);
    Ok(result)
}
