//! Validation dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request
//!     → middleware.rs (route and mount middlewares, declaration order)
//!     → pipeline.rs (read body, validate body → params → query)
//!         ├─ failure → 422 "Invalid request!"
//!         └─ success → context.rs (RouteContext with parsed values)
//!     → handler.rs (user handler, return value sent when non-empty)
//!     → ResponseWriter → wire response
//!
//! Handler error or panic:
//!     → marked 500 (HandlerFailure)
//!     → map_failures layer → ErrorHandler
//! ```
//!
//! # Design Decisions
//! - No per-request shared state beyond the response writer
//! - No timeouts or retries; a hung handler hangs its request
//! - Only the validation failure is answered in-band

pub mod context;
pub mod handler;
pub mod middleware;
pub mod pipeline;

pub use context::{
    Payload, RawRequest, RecordedWrite, ResponseWriter, RouteContext, ValidatedRequest,
};
pub use handler::{Handler, HandlerError, HandlerOutput};
pub use middleware::{
    default_error_handler, make_middleware, ErrorHandler, HandlerFailure, Middleware,
};
pub use pipeline::{invalid_request, Part, INVALID_REQUEST};
