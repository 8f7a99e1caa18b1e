//! Append-only route registry.
//!
//! # Responsibilities
//! - Keep registered routes in registration order
//! - Hand out cheap read-only snapshots for document generation
//! - Compose mount prefixes and normalise path syntax
//! - Decide which registration owns a method+path binding
//!
//! # Design Decisions
//! - Only `append` and `snapshot`; no removal, no reordering
//! - Entries are `Arc`ed and immutable once appended
//! - First registration of a method+path wins the binding; later ones are
//!   still listed so the registry mirrors every declaration

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::routing::MethodRouter;

use crate::dispatch::middleware::apply_middlewares;
use crate::dispatch::Middleware;
use crate::routing::descriptor::{Method, RouteDoc};

/// One registered route: its documentation view and its dispatch binding.
pub struct RouteEntry {
    doc: RouteDoc,
    binding: MethodRouter,
    /// Path as written, before normalisation; prefixes join onto this.
    declared: String,
}

impl RouteEntry {
    pub(crate) fn new(mut doc: RouteDoc, binding: MethodRouter) -> Self {
        let declared = std::mem::take(&mut doc.path);
        doc.path = normalize_path(&declared);
        Self {
            doc,
            binding,
            declared,
        }
    }

    pub fn doc(&self) -> &RouteDoc {
        &self.doc
    }

    pub fn method(&self) -> Method {
        self.doc.method
    }

    pub fn path(&self) -> &str {
        &self.doc.path
    }

    pub(crate) fn binding(&self) -> MethodRouter {
        self.binding.clone()
    }

    /// Copy of this entry mounted under `prefix`, wrapped in the mount's middlewares.
    pub(crate) fn relocate(&self, prefix: &str, middlewares: &[Middleware]) -> RouteEntry {
        let declared = join_prefix(prefix, &self.declared);
        let mut doc = self.doc.clone();
        doc.path = normalize_path(&declared);
        RouteEntry {
            doc,
            binding: apply_middlewares(self.binding.clone(), middlewares),
            declared,
        }
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry").field("doc", &self.doc).finish()
    }
}

/// Ordered, append-only collection of routes.
#[derive(Debug, Default, Clone)]
pub struct RouteRegistry {
    entries: Vec<Arc<RouteEntry>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: RouteEntry) -> Arc<RouteEntry> {
        tracing::debug!(
            method = %entry.method(),
            path = %entry.path(),
            position = self.entries.len(),
            "route registered"
        );
        let entry = Arc::new(entry);
        self.entries.push(Arc::clone(&entry));
        entry
    }

    pub fn snapshot(&self) -> RouteSnapshot {
        RouteSnapshot {
            entries: self.entries.iter().cloned().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Frozen, shareable view of a registry.
#[derive(Debug, Clone)]
pub struct RouteSnapshot {
    entries: Arc<[Arc<RouteEntry>]>,
}

impl RouteSnapshot {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.entries.iter()
    }

    pub fn docs(&self) -> impl Iterator<Item = &RouteDoc> {
        self.entries.iter().map(|entry| entry.doc())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of [`BindingSet::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the binding.
    Bound,
    /// The same method and path were bound earlier.
    Duplicate,
    /// A parameter segment is spelled differently from an earlier binding,
    /// which the router cannot hold side by side.
    Conflict { existing: String },
}

/// Tracks which method+path pairs already have a router binding.
///
/// Also remembers how each parameter segment was spelled, keyed by the
/// path shape in front of it, so `/pets/{id}` and `/pets/{petId}` are
/// caught before they reach the router.
#[derive(Debug, Default, Clone)]
pub struct BindingSet {
    claimed: HashSet<(Method, String)>,
    wildcards: HashMap<String, String>,
}

impl BindingSet {
    pub fn claim(&mut self, method: Method, path: &str) -> Claim {
        let mut fresh = Vec::new();
        let mut shape = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment.contains('{') {
                match self.wildcards.get(&shape) {
                    Some(existing) if existing != segment => {
                        return Claim::Conflict {
                            existing: format!("{shape}/{existing}"),
                        };
                    }
                    Some(_) => {}
                    None => fresh.push((shape.clone(), segment.to_string())),
                }
                shape.push_str("/{}");
            } else {
                shape.push('/');
                shape.push_str(segment);
            }
        }

        if !self.claimed.insert((method, path.to_string())) {
            return Claim::Duplicate;
        }
        self.wildcards.extend(fresh);
        Claim::Bound
    }
}

/// `prefix + path`, dropping one slash when both sides supply it.
pub fn join_prefix(prefix: &str, path: &str) -> String {
    if prefix.ends_with('/') && path.starts_with('/') {
        format!("{}{}", prefix, &path[1..])
    } else {
        format!("{prefix}{path}")
    }
}

/// Leading slash, `:name` segments rewritten to `{name}`, `*name` to `{*name}`.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let rewritten = path
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*').filter(|n| !n.is_empty()) {
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/");
    if rewritten.starts_with('/') {
        rewritten
    } else {
        format!("/{rewritten}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::descriptor::Route;

    #[test]
    fn test_join_prefix_elides_one_slash() {
        assert_eq!(join_prefix("/api/", "/x"), "/api/x");
        assert_eq!(join_prefix("/api", "/x"), "/api/x");
        assert_eq!(join_prefix("/api/", "x"), "/api/x");
        assert_eq!(join_prefix("/api", "x"), "/apix");
        assert_eq!(join_prefix("/api//", "/x"), "/api//x");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/pets/:id"), "/pets/{id}");
        assert_eq!(normalize_path("/pets/{id}"), "/pets/{id}");
        assert_eq!(normalize_path("pets"), "/pets");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/a/:b/c/:d"), "/a/{b}/c/{d}");
        assert_eq!(normalize_path("/files/*rest"), "/files/{*rest}");
    }

    #[test]
    fn test_registry_keeps_order_and_snapshots_are_frozen() {
        let mut registry = RouteRegistry::new();
        registry.append(Route::get("/a").handler(|_ctx| async {}).into_entry());
        registry.append(Route::post("/b").handler(|_ctx| async {}).into_entry());

        let snapshot = registry.snapshot();
        registry.append(Route::get("/a").handler(|_ctx| async {}).into_entry());

        let paths: Vec<_> = snapshot.docs().map(|d| d.path.clone()).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_relocate_rewrites_path() {
        let entry = Route::get("/:id").handler(|_ctx| async {}).into_entry();
        let moved = entry.relocate("/api/", &[]);
        assert_eq!(moved.path(), "/api/{id}");
        assert_eq!(entry.path(), "/{id}");
    }

    #[test]
    fn test_relocate_joins_the_declared_path() {
        let entry = Route::get("").handler(|_ctx| async {}).into_entry();
        assert_eq!(entry.path(), "/");
        assert_eq!(entry.relocate("/api", &[]).path(), "/api");
        assert_eq!(entry.relocate("/api/", &[]).path(), "/api/");

        let entry = Route::get("items").handler(|_ctx| async {}).into_entry();
        assert_eq!(entry.relocate("/api/", &[]).path(), "/api/items");
    }

    #[test]
    fn test_binding_first_claim_wins() {
        let mut bindings = BindingSet::default();
        assert_eq!(bindings.claim(Method::Get, "/x"), Claim::Bound);
        assert_eq!(bindings.claim(Method::Get, "/x"), Claim::Duplicate);
        assert_eq!(bindings.claim(Method::Post, "/x"), Claim::Bound);
    }

    #[test]
    fn test_binding_rejects_renamed_parameter() {
        let mut bindings = BindingSet::default();
        assert_eq!(bindings.claim(Method::Get, "/pets/{id}"), Claim::Bound);
        assert_eq!(bindings.claim(Method::Delete, "/pets/{id}"), Claim::Bound);
        assert_eq!(bindings.claim(Method::Get, "/pets/{id}/toys"), Claim::Bound);
        assert_eq!(
            bindings.claim(Method::Delete, "/pets/{petId}"),
            Claim::Conflict {
                existing: "/pets/{id}".to_string()
            }
        );
        assert_eq!(
            bindings.claim(Method::Get, "/pets/{*rest}"),
            Claim::Conflict {
                existing: "/pets/{id}".to_string()
            }
        );
        assert_eq!(bindings.claim(Method::Get, "/owners/{petId}"), Claim::Bound);
    }

    #[test]
    fn test_conflicting_claim_leaves_no_trace() {
        let mut bindings = BindingSet::default();
        assert_eq!(bindings.claim(Method::Get, "/a/{x}"), Claim::Bound);
        assert!(matches!(
            bindings.claim(Method::Get, "/a/{y}/b/{z}"),
            Claim::Conflict { .. }
        ));
        assert_eq!(bindings.claim(Method::Get, "/a/{x}/b/{w}"), Claim::Bound);
    }
}
