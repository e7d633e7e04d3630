//! Path matching.
//!
//! # Responsibilities
//! - Define the `PathMatcher` seam the dispatcher registers routes into
//! - Provide `MatchitMatcher`: one radix tree per HTTP method
//!
//! # Design Decisions
//! - Patterns use the matcher syntax (`/users/{id}`, `/files/{*rest}`);
//!   translation from Express syntax happens in `routing::path`
//! - Conflicting or duplicate patterns are insertion errors, surfaced when
//!   the route table is built

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::routing::dispatcher::ResolvedRoute;

/// Result of a successful match.
#[derive(Debug, Clone)]
pub struct Matched {
    pub route: Arc<ResolvedRoute>,
    /// Path parameters in the order they appear in the pattern.
    pub params: Vec<(String, String)>,
}

/// Maps `(method, path)` to a resolved route.
pub trait PathMatcher: Default + Send + Sync {
    fn insert(&mut self, method: &Method, pattern: &str, route: Arc<ResolvedRoute>) -> Result<(), String>;

    fn find(&self, method: &Method, path: &str) -> Option<Matched>;

    /// Methods with a route matching `path`, in registration order.
    fn allowed(&self, path: &str) -> Vec<Method>;
}

/// `PathMatcher` backed by `matchit`.
#[derive(Default)]
pub struct MatchitMatcher {
    trees: HashMap<Method, matchit::Router<Arc<ResolvedRoute>>>,
    methods: Vec<Method>,
}

impl std::fmt::Debug for MatchitMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchitMatcher")
            .field("methods", &self.methods)
            .finish()
    }
}

impl PathMatcher for MatchitMatcher {
    fn insert(&mut self, method: &Method, pattern: &str, route: Arc<ResolvedRoute>) -> Result<(), String> {
        if !self.methods.contains(method) {
            self.methods.push(method.clone());
        }
        self.trees
            .entry(method.clone())
            .or_default()
            .insert(pattern, route)
            .map_err(|e| e.to_string())
    }

    fn find(&self, method: &Method, path: &str) -> Option<Matched> {
        let found = self.trees.get(method)?.at(path).ok()?;
        let params = found
            .params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Some(Matched {
            route: Arc::clone(found.value),
            params,
        })
    }

    fn allowed(&self, path: &str) -> Vec<Method> {
        self.methods
            .iter()
            .filter(|method| {
                self.trees
                    .get(*method)
                    .is_some_and(|tree| tree.at(path).is_ok())
            })
            .cloned()
            .collect()
    }
}
