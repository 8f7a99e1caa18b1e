//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route::get(path) ... .handler(f)
//!     → descriptor.rs (RouteDescriptor: schemas, responses, metadata, handler)
//!     → into_entry: RouteDoc (document view) + MethodRouter (dispatch binding)
//!     → registry.rs (append-only, registration order)
//!
//! Mounting (at startup):
//!     SubRouter entries
//!     → join_prefix + normalize_path
//!     → mount middlewares wrapped around each binding
//!     → appended to the Application registry
//! ```
//!
//! # Design Decisions
//! - Routes are declared once and drive both dispatch and documentation
//! - Registry is frozen into a snapshot when the router is built
//! - Duplicate method+path: first binding wins, every declaration is listed

pub mod descriptor;
pub mod registry;

pub use descriptor::{
    BodyDoc, BodySpec, Method, ResponseSpec, Route, RouteBuilder, RouteDescriptor, RouteDoc,
    UnknownMethod, ValidateRequest,
};
pub use registry::{
    join_prefix, normalize_path, BindingSet, Claim, RouteEntry, RouteRegistry, RouteSnapshot,
};
