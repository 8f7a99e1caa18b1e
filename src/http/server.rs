//! Serving an application router.
//!
//! # Responsibilities
//! - Wire up the outer middleware (body limit, tracing, request ID)
//! - Bind a listener and serve with graceful shutdown
//!
//! # Design Decisions
//! - Request IDs are UUID v4 in `x-request-id`, propagated to the response
//! - Ctrl+C triggers graceful shutdown; if the handler cannot be installed
//!   the server runs until killed

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpOptions;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outer layers shared by every route.
pub(crate) fn apply_http_layers(router: Router, http: &HttpOptions) -> Router {
    let mut router = router.layer(DefaultBodyLimit::max(http.max_body_bytes));
    if http.trace_requests {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

pub async fn bind(addr: &str) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr).await.map_err(|source| ServeError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Serve `router` on `listener` until `signal` resolves.
pub async fn serve_router<F>(
    listener: TcpListener,
    router: Router,
    signal: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!(address = %addr, "App running at http://localhost:{}", addr.port());

    axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable, graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
