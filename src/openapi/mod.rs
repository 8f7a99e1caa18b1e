//! OpenAPI document subsystem.
//!
//! # Data Flow
//! ```text
//! GET <json_path>
//!     → RouteSnapshot (frozen registry, registration order)
//!     → projector.rs (operations, parameters, bodies, responses)
//!     → schema::mock (examples for schemas that declare none)
//!     → utoipa OpenApi → JSON text
//! ```
//!
//! # Design Decisions
//! - Generated per request; with an unseeded mock generator examples vary
//! - utoipa builders do the document assembly; this module only maps routes onto them

pub mod projector;

pub use projector::SpecProjector;
