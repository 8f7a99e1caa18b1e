//! HTTP composition subsystem.
//!
//! # Data Flow
//! ```text
//! Application::route / SubRouter::route
//!     → registry append + router binding (validation dispatch)
//! Application::mount(prefix, SubRouter)
//!     → entries relocated under prefix, bound on the application router
//! Application::into_router
//!     → GET <json_path> (document per request)
//!     → docs.rs viewers (mounted at construction)
//!     → server.rs layers (failure mapping, body limit, trace, request ID)
//!     → axum::serve
//! ```

pub mod application;
pub mod docs;
pub mod server;
pub mod sub_router;

pub use application::Application;
pub use docs::{mount_docs, render_page};
pub use server::{shutdown_signal, ServeError};
pub use sub_router::SubRouter;
