//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or PartialApplicationOptions in code
//!     → loader.rs (parse & deserialize)
//!     → ApplicationOptions::merge (shallow override of the defaults)
//!     → validation.rs (semantic checks)
//!     → ApplicationOptions (validated, fixed for the Application's lifetime)
//! ```
//!
//! # Design Decisions
//! - Options are fixed at construction; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_options, parse_options, ConfigError};
pub use schema::{
    ApplicationOptions, DocsOptions, DocsViewer, HttpOptions, InfoOptions, OpenApiOptions,
    PartialApplicationOptions, ServerOptions,
};
pub use validation::{validate_options, ValidationError};
