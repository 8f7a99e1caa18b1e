//! Configuration schema definitions.
//!
//! This module defines the options an [`Application`](crate::Application) is
//! built from. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Fully specified application options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationOptions {
    /// Synthesize examples for schemas that declare none.
    pub generate_mock_examples: bool,

    /// Documentation viewer mount paths.
    pub docs: DocsOptions,

    /// Path serving the JSON document.
    pub json_path: String,

    /// Document metadata.
    pub openapi: OpenApiOptions,

    /// Seed for example synthesis; unset means a fresh seed per document.
    pub mock_seed: Option<u64>,

    /// Request handling limits and layers.
    pub http: HttpOptions,
}

impl Default for ApplicationOptions {
    fn default() -> Self {
        Self {
            generate_mock_examples: true,
            docs: DocsOptions::default(),
            json_path: "/api/openapi.json".to_string(),
            openapi: OpenApiOptions::default(),
            mock_seed: None,
            http: HttpOptions::default(),
        }
    }
}

impl ApplicationOptions {
    /// Override top-level keys present in `partial`. Nested records are
    /// replaced whole, not merged field by field.
    pub fn merge(self, partial: PartialApplicationOptions) -> Self {
        Self {
            generate_mock_examples: partial
                .generate_mock_examples
                .unwrap_or(self.generate_mock_examples),
            docs: partial.docs.unwrap_or(self.docs),
            json_path: partial.json_path.unwrap_or(self.json_path),
            openapi: partial.openapi.unwrap_or(self.openapi),
            mock_seed: partial.mock_seed.or(self.mock_seed),
            http: partial.http.unwrap_or(self.http),
        }
    }
}

/// Documentation viewers. A missing or empty path disables that viewer.
///
/// Fields carry no struct-level default: a `[docs]` table that names only
/// one viewer disables the other.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DocsOptions {
    #[serde(default)]
    pub scalar: Option<String>,

    #[serde(default)]
    pub redocly: Option<String>,
}

impl Default for DocsOptions {
    fn default() -> Self {
        Self {
            scalar: Some("/docs".to_string()),
            redocly: Some("/redocly".to_string()),
        }
    }
}

impl DocsOptions {
    /// No viewer mounted.
    pub fn disabled() -> Self {
        Self {
            scalar: None,
            redocly: None,
        }
    }

    pub fn scalar_path(&self) -> Option<&str> {
        self.scalar.as_deref().filter(|p| !p.is_empty())
    }

    pub fn redocly_path(&self) -> Option<&str> {
        self.redocly.as_deref().filter(|p| !p.is_empty())
    }

    /// Enabled viewers with their mount paths.
    pub fn enabled(&self) -> Vec<(DocsViewer, &str)> {
        let mut out = Vec::new();
        if let Some(path) = self.scalar_path() {
            out.push((DocsViewer::Scalar, path));
        }
        if let Some(path) = self.redocly_path() {
            out.push((DocsViewer::Redoc, path));
        }
        out
    }
}

/// Supported documentation viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocsViewer {
    Scalar,
    Redoc,
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenApiOptions {
    pub info: InfoOptions,

    /// Optional `servers` entries.
    pub servers: Vec<ServerOptions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InfoOptions {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for InfoOptions {
    fn default() -> Self {
        Self {
            title: "Sample API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerOptions {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// HTTP layer settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpOptions {
    /// Request body limit in bytes; larger bodies get 413.
    pub max_body_bytes: usize,

    /// Install a `TraceLayer` around the router.
    pub trace_requests: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,
            trace_requests: true,
        }
    }
}

/// Options as given by the caller; unset keys fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PartialApplicationOptions {
    pub generate_mock_examples: Option<bool>,
    pub docs: Option<DocsOptions>,
    pub json_path: Option<String>,
    pub openapi: Option<OpenApiOptions>,
    pub mock_seed: Option<u64>,
    pub http: Option<HttpOptions>,
}
