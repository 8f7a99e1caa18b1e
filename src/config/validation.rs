//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check mount paths are absolute and do not collide
//! - Validate value ranges (body limit > 0, non-empty metadata)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ApplicationOptions → Result<(), Vec<ValidationError>>
//! - Runs before options are accepted by an Application

use thiserror::Error;

use crate::config::schema::ApplicationOptions;

/// One problem found in the options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_options(options: &ApplicationOptions) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !options.json_path.starts_with('/') {
        errors.push(ValidationError::new("json_path", "must start with '/'"));
    }

    let scalar = options.docs.scalar_path();
    let redocly = options.docs.redocly_path();
    for (field, path) in [("docs.scalar", scalar), ("docs.redocly", redocly)] {
        let Some(path) = path else { continue };
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
        if path == options.json_path {
            errors.push(ValidationError::new(field, "collides with json_path"));
        }
    }
    if scalar.is_some() && scalar == redocly {
        errors.push(ValidationError::new("docs.redocly", "collides with docs.scalar"));
    }

    if options.openapi.info.title.trim().is_empty() {
        errors.push(ValidationError::new("openapi.info.title", "must not be empty"));
    }
    if options.openapi.info.version.trim().is_empty() {
        errors.push(ValidationError::new("openapi.info.version", "must not be empty"));
    }
    for server in &options.openapi.servers {
        if url::Url::parse(&server.url).is_err() && !server.url.starts_with('/') {
            errors.push(ValidationError::new(
                "openapi.servers",
                format!("'{}' is neither an absolute URL nor a path", server.url),
            ));
        }
    }

    if options.http.max_body_bytes == 0 {
        errors.push(ValidationError::new("http.max_body_bytes", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
