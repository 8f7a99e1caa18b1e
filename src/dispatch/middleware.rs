//! Route middlewares and failure mapping.
//!
//! # Responsibilities
//! - Wrap a route binding in its declared middlewares
//! - Turn handler failures into responses through a pluggable error handler
//!
//! # Design Decisions
//! - Middlewares run in declaration order, outermost first
//! - Failures travel as a response extension so the error handler can be
//!   installed once at the application edge

use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use axum::Router;
use futures_util::future::BoxFuture;

use super::handler::HandlerError;

/// A request interceptor: call `next.run(req)` to continue, or answer directly.
pub type Middleware = Arc<dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync>;

/// Maps a handler failure to the response the client sees.
pub type ErrorHandler = Arc<dyn Fn(&HandlerError) -> Response + Send + Sync>;

/// Build a [`Middleware`] from an async function.
pub fn make_middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req: Request, next: Next| -> BoxFuture<'static, Response> {
        Box::pin(f(req, next))
    })
}

/// Wrap `binding` so `middlewares[0]` sees the request first.
pub fn apply_middlewares(binding: MethodRouter, middlewares: &[Middleware]) -> MethodRouter {
    middlewares.iter().rev().fold(binding, |binding, mw| {
        let mw = Arc::clone(mw);
        binding.layer(from_fn(move |req: Request, next: Next| (*mw)(req, next)))
    })
}

/// Marker left on a response produced for a failed handler.
#[derive(Clone)]
pub struct HandlerFailure(pub Arc<HandlerError>);

impl HandlerFailure {
    /// Default 500 response carrying the marker.
    pub fn into_response(self) -> Response {
        let mut response =
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Logs the failure and answers with a bare 500.
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: &HandlerError| {
        tracing::error!(error = %err, panicked = err.is_panic(), "route handler failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    })
}

/// Replace marked failure responses with whatever `handler` produces.
pub fn map_failures(router: Router, handler: ErrorHandler) -> Router {
    router.layer(from_fn(move |req: Request, next: Next| {
        let handler = Arc::clone(&handler);
        async move {
            let response = next.run(req).await;
            if let Some(failure) = response.extensions().get::<HandlerFailure>().cloned() {
                return handler(&failure.0);
            }
            response
        }
    }))
}
