//! The application: composition root for routes, docs and the JSON document.
//!
//! # Responsibilities
//! - Own the router, the route registry and the options
//! - Register routes directly or by absorbing sub-routers under a prefix
//! - Serve the JSON document and the documentation viewers
//! - Build the final router and serve it
//!
//! # Design Decisions
//! - Options are merged over the defaults once, at construction
//! - The JSON path and docs paths are claimed first, so routes cannot shadow them
//! - The document is regenerated for every request to the JSON path

use std::sync::Arc;

use axum::handler::Handler as AxumHandler;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{self, MethodRouter};
use axum::Router;
use tokio::net::TcpListener;
use utoipa::openapi::OpenApi;

use super::docs::mount_docs;
use super::server::{self, ServeError};
use super::sub_router::SubRouter;
use crate::config::{ApplicationOptions, PartialApplicationOptions};
use crate::dispatch::middleware::{default_error_handler, map_failures};
use crate::dispatch::{ErrorHandler, HandlerError, Middleware};
use crate::openapi::SpecProjector;
use crate::routing::{
    normalize_path, BindingSet, Claim, Method, RouteDescriptor, RouteEntry, RouteRegistry,
    RouteSnapshot,
};

pub struct Application {
    router: Router,
    registry: RouteRegistry,
    bindings: BindingSet,
    options: ApplicationOptions,
    error_handler: ErrorHandler,
}

impl Application {
    /// Application with the default options.
    pub fn new() -> Self {
        Self::from_options(ApplicationOptions::default())
    }

    /// Application with `partial` merged over the default options.
    pub fn with_options(partial: PartialApplicationOptions) -> Self {
        Self::from_options(ApplicationOptions::default().merge(partial))
    }

    /// Application with fully specified options.
    pub fn from_options(options: ApplicationOptions) -> Self {
        let mut bindings = BindingSet::default();
        bindings.claim(Method::Get, &normalize_path(&options.json_path));
        for (_, path) in options.docs.enabled() {
            bindings.claim(Method::Get, &normalize_path(path));
        }
        let router = mount_docs(
            Router::new(),
            &options.docs,
            &options.openapi.info.title,
            &options.json_path,
        );
        tracing::debug!(
            json_path = %options.json_path,
            mock_examples = options.generate_mock_examples,
            "application created"
        );
        Self {
            router,
            registry: RouteRegistry::new(),
            bindings,
            options,
            error_handler: default_error_handler(),
        }
    }

    /// Register a route: append it to the registry and bind it.
    pub fn route<B, P, Q>(&mut self, descriptor: RouteDescriptor<B, P, Q>) -> &mut Self
    where
        B: Send + 'static,
        P: Send + 'static,
        Q: Send + 'static,
    {
        self.install(descriptor.into_entry());
        self
    }

    /// Absorb every route of `sub` under `prefix`.
    pub fn mount(&mut self, prefix: &str, sub: SubRouter) -> &mut Self {
        self.mount_with(prefix, sub, Vec::new())
    }

    /// Absorb `sub` under `prefix`, running `middlewares` before each route's own.
    pub fn mount_with(
        &mut self,
        prefix: &str,
        sub: SubRouter,
        middlewares: Vec<Middleware>,
    ) -> &mut Self {
        tracing::debug!(prefix = %prefix, routes = sub.len(), "mounting sub-router");
        for entry in sub.entries() {
            self.install(entry.relocate(prefix, &middlewares));
        }
        self
    }

    fn install(&mut self, entry: RouteEntry) {
        let entry = self.registry.append(entry);
        self.bind(entry.method(), entry.path(), entry.binding());
    }

    fn bind(&mut self, method: Method, path: &str, binding: MethodRouter) {
        match self.bindings.claim(method, path) {
            Claim::Bound => {
                self.router = std::mem::take(&mut self.router).route(path, binding);
            }
            Claim::Duplicate => tracing::warn!(
                method = %method,
                path = %path,
                "method and path already bound, first registration wins"
            ),
            Claim::Conflict { existing } => tracing::warn!(
                method = %method,
                path = %path,
                existing = %existing,
                "parameter name clashes with an earlier route, binding skipped"
            ),
        }
    }

    /// Bind a plain axum method router, undocumented and unvalidated.
    pub fn raw_route(&mut self, method: Method, path: &str, binding: MethodRouter) -> &mut Self {
        let path = normalize_path(path);
        self.bind(method, &path, binding);
        self
    }

    pub fn get<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        self.raw_route(Method::Get, path, routing::get(handler))
    }

    pub fn post<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        self.raw_route(Method::Post, path, routing::post(handler))
    }

    pub fn put<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        self.raw_route(Method::Put, path, routing::put(handler))
    }

    pub fn patch<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        self.raw_route(Method::Patch, path, routing::patch(handler))
    }

    pub fn delete<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        self.raw_route(Method::Delete, path, routing::delete(handler))
    }

    /// Replace the handler that turns handler errors and panics into responses.
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&HandlerError) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Registered routes in registration order, with their effective paths.
    pub fn routes(&self) -> RouteSnapshot {
        self.registry.snapshot()
    }

    pub fn options(&self) -> &ApplicationOptions {
        &self.options
    }

    /// Generate the document for the routes registered so far.
    pub fn spec(&self) -> OpenApi {
        let snapshot = self.registry.snapshot();
        SpecProjector::new(&self.options).project(snapshot.docs())
    }

    pub fn spec_json(&self) -> Result<String, serde_json::Error> {
        self.spec().to_json()
    }

    /// Freeze the registry and build the final router.
    pub fn into_router(self) -> Router {
        let snapshot = self.registry.snapshot();
        let http = self.options.http.clone();
        let json_path = normalize_path(&self.options.json_path);
        let options = Arc::new(self.options);

        let document = routing::get(move || {
            let response = document_response(&snapshot, &options);
            async move { response }
        });
        let router = self.router.route(&json_path, document);
        let router = map_failures(router, self.error_handler);
        server::apply_http_layers(router, &http)
    }

    /// Serve on `listener` until Ctrl+C.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServeError> {
        self.serve_with_shutdown(listener, server::shutdown_signal()).await
    }

    /// Serve on `listener` until `signal` resolves.
    pub async fn serve_with_shutdown<F>(
        self,
        listener: TcpListener,
        signal: F,
    ) -> Result<(), ServeError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        server::serve_router(listener, self.into_router(), signal).await
    }

    /// Bind `addr` and serve until Ctrl+C.
    pub async fn listen(self, addr: &str) -> Result<(), ServeError> {
        let listener = server::bind(addr).await?;
        self.serve(listener).await
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("routes", &self.registry.len())
            .field("options", &self.options)
            .finish()
    }
}

fn document_response(snapshot: &RouteSnapshot, options: &ApplicationOptions) -> Response {
    match SpecProjector::new(options).project(snapshot.docs()).to_json() {
        Ok(json) => ([(CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "document serialization failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
