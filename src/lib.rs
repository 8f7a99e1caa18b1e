//! Typed route registration over axum with a generated OpenAPI document.
//!
//! # Architecture Overview
//!
//! ```text
//!   Route::post("/pets").body(Typed::<NewPet>::new()).handler(...)
//!         │
//!         ▼
//!   ┌──────────────┐   mount(prefix)   ┌──────────────────────────────────┐
//!   │  SubRouter   │──────────────────▶│           Application            │
//!   └──────────────┘                   │  registry (append-only)          │
//!                                      │  axum Router (validation dispatch)│
//!                                      └───────┬───────────────┬──────────┘
//!                                              │               │
//!                                   per request▼               ▼ GET <json_path>
//!                          ┌────────────────────────┐  ┌──────────────────┐
//!                          │ dispatch: body → params │  │ openapi projector│
//!                          │ → query → handler       │  │ + mock examples  │
//!                          └────────────────────────┘  └──────────────────┘
//!                                                               │
//!                                                 docs viewers ◀┘ (Scalar, Redoc)
//! ```

pub mod config;
pub mod dispatch;
pub mod http;
pub mod observability;
pub mod openapi;
pub mod routing;
pub mod schema;

pub use config::{ApplicationOptions, PartialApplicationOptions};
pub use dispatch::{make_middleware, HandlerError, Middleware, Payload, RouteContext};
pub use http::{Application, SubRouter};
pub use routing::{BodySpec, Method, ResponseSpec, Route, RouteDescriptor};
pub use schema::{Schema, SchemaDoc, Typed};
