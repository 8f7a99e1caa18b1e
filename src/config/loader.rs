//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ApplicationOptions, PartialApplicationOptions};
use crate::config::validation::{validate_options, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, merge over defaults, and validate options from a TOML file.
pub fn load_options(path: &Path) -> Result<ApplicationOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    let options = parse_options(&content)?;
    tracing::info!(path = %path.display(), "options loaded");
    Ok(options)
}

/// Same as [`load_options`] for an in-memory TOML document.
pub fn parse_options(content: &str) -> Result<ApplicationOptions, ConfigError> {
    let partial: PartialApplicationOptions = toml::from_str(content)?;
    let options = ApplicationOptions::default().merge(partial);
    validate_options(&options).map_err(ConfigError::Validation)?;
    Ok(options)
}
