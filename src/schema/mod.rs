//! Schema subsystem.
//!
//! # Data Flow
//! ```text
//! Declared schema (Typed<T>, raw utoipa schema)
//!     → Schema::parse_json / parse_pairs (request validation, coercion)
//!     → SchemaDoc::schema / components (document projection)
//!     → mock.rs (synthesised examples from the JSON form)
//! ```
//!
//! # Design Decisions
//! - One value both validates requests and documents the operation
//! - Parsing returns the parsed value, never the raw input
//! - Params and query arrive as string pairs; numeric and boolean strings
//!   are coerced through the urlencoded deserializer

pub mod mock;
pub mod typed;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use utoipa::openapi::schema::Schema as OpenApiSchema;
use utoipa::openapi::RefOr;

pub use mock::MockGenerator;
pub use typed::Typed;

/// Named schema that must be published under `#/components/schemas`.
pub type Component = (String, RefOr<OpenApiSchema>);

/// Why an input was rejected by a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Body could not be decoded into the declared type.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// Params or query could not be decoded into the declared type.
    #[error("invalid form input: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// Raw pairs could not be re-encoded before decoding.
    #[error("could not encode pairs: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// A custom check declared with `Typed::refine` failed.
    #[error("refinement failed: {0}")]
    Refinement(String),
}

/// Documentation side of a schema.
pub trait SchemaDoc: Send + Sync + 'static {
    /// Schema placed inline wherever the declaring route uses it.
    fn schema(&self) -> RefOr<OpenApiSchema>;

    /// Schemas referenced by `$ref` from [`SchemaDoc::schema`].
    fn components(&self) -> Vec<Component> {
        Vec::new()
    }
}

/// Validation side of a schema: `safeParse` split by input shape.
pub trait Schema: SchemaDoc {
    type Output: Send + 'static;

    /// Parse a decoded JSON body.
    fn parse_json(&self, value: &Value) -> Result<Self::Output, SchemaError>;

    /// Parse path params or query pairs, coercing scalar strings.
    fn parse_pairs(&self, pairs: &[(String, String)]) -> Result<Self::Output, SchemaError>;
}

impl SchemaDoc for RefOr<OpenApiSchema> {
    fn schema(&self) -> RefOr<OpenApiSchema> {
        self.clone()
    }
}

impl SchemaDoc for OpenApiSchema {
    fn schema(&self) -> RefOr<OpenApiSchema> {
        RefOr::T(self.clone())
    }
}

/// A declared schema kept both as a parser and as documentation.
pub struct SchemaRef<T> {
    parser: Arc<dyn Schema<Output = T>>,
    doc: Arc<dyn SchemaDoc>,
}

impl<T: Send + 'static> SchemaRef<T> {
    pub fn new<S>(schema: S) -> Self
    where
        S: Schema<Output = T>,
    {
        let schema = Arc::new(schema);
        Self {
            parser: schema.clone(),
            doc: schema,
        }
    }

    pub fn parse_json(&self, value: &Value) -> Result<T, SchemaError> {
        self.parser.parse_json(value)
    }

    pub fn parse_pairs(&self, pairs: &[(String, String)]) -> Result<T, SchemaError> {
        self.parser.parse_pairs(pairs)
    }

    pub fn doc(&self) -> Arc<dyn SchemaDoc> {
        Arc::clone(&self.doc)
    }
}

impl<T> Clone for SchemaRef<T> {
    fn clone(&self) -> Self {
        Self {
            parser: Arc::clone(&self.parser),
            doc: Arc::clone(&self.doc),
        }
    }
}
