//! Sub-routers: route groups that know nothing of where they are mounted.

use std::sync::Arc;

use axum::Router;

use crate::dispatch::middleware::{default_error_handler, map_failures};
use crate::routing::{BindingSet, Claim, RouteDescriptor, RouteEntry, RouteRegistry, RouteSnapshot};

/// An ordered group of routes, mountable under a prefix by an
/// [`Application`](super::Application) or usable on its own.
#[derive(Default)]
pub struct SubRouter {
    router: Router,
    registry: RouteRegistry,
    bindings: BindingSet,
}

impl SubRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route and bind it on this sub-router's own router.
    pub fn route<B, P, Q>(&mut self, descriptor: RouteDescriptor<B, P, Q>) -> &mut Self
    where
        B: Send + 'static,
        P: Send + 'static,
        Q: Send + 'static,
    {
        let entry = self.registry.append(descriptor.into_entry());
        match self.bindings.claim(entry.method(), entry.path()) {
            Claim::Bound => {
                self.router =
                    std::mem::take(&mut self.router).route(entry.path(), entry.binding());
            }
            Claim::Duplicate => tracing::warn!(
                method = %entry.method(),
                path = %entry.path(),
                "duplicate route in sub-router, first registration keeps the binding"
            ),
            Claim::Conflict { existing } => tracing::warn!(
                method = %entry.method(),
                path = %entry.path(),
                existing = %existing,
                "parameter name clashes with an earlier route in sub-router, binding skipped"
            ),
        }
        self
    }

    /// Routes in registration order, with their unprefixed paths.
    pub fn routes(&self) -> RouteSnapshot {
        self.registry.snapshot()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.registry.iter()
    }

    /// Standalone router with the default failure mapping.
    pub fn into_router(self) -> Router {
        map_failures(self.router, default_error_handler())
    }
}

impl std::fmt::Debug for SubRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubRouter")
            .field("registry", &self.registry)
            .finish()
    }
}
