//! Walk-once dispatch table.
//!
//! # Responsibilities
//! - Walk the router tree exactly once and register every entry with the
//!   path matcher, combined with its node's effective middleware
//! - Resolve `(method, path)` to a handler chain, a 405 or a 404
//!
//! # Design Decisions
//! - The walk is guarded by a `OnceLock`: concurrent first callers block
//!   until the single walk finishes, later calls reuse its result
//! - The dispatcher owns the tree, so nothing can be registered after the
//!   walk
//! - A failed walk is cached too; every later call reports the same error
//! - `HEAD` falls back to the `GET` route when no `HEAD` route is registered
//!
//! # Data Flow
//! ```text
//! RouteTree (setup phase)
//!     → walk(): DFS pre-order over nodes
//!         → effective middleware + entry handlers
//!         → PathMatcher::insert(method, pattern, ResolvedRoute)
//!     → RouteTable (frozen)
//!
//! lookup(method, path)
//!     → Found { route, params } | MethodNotAllowed(allowed) | NotFound
//! ```

use std::sync::{Arc, OnceLock};

use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::error::SetupError;
use crate::http::handler::{Handler, ParamHandler};
use crate::routing::matcher::{MatchitMatcher, Matched, PathMatcher};
use crate::routing::path;
use crate::routing::tree::RouteTree;

/// An entry combined with everything that runs before it.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub method: Method,
    /// Absolute path, Express syntax.
    pub path: String,
    /// Base path of the node that registered the entry.
    pub base: String,
    /// Effective middleware followed by the entry's own handlers.
    pub handlers: Vec<Handler>,
    /// Param handlers of the registering node.
    pub params: Vec<(String, ParamHandler)>,
}

impl ResolvedRoute {
    /// The handler chain for one request: matching param handlers first, in
    /// the order the parameters appear in the path, then the route handlers.
    pub fn chain(&self, params: &[(String, String)]) -> Vec<Handler> {
        let mut chain: Vec<Handler> = params
            .iter()
            .filter_map(|(name, value)| {
                self.params
                    .iter()
                    .find(|(registered, _)| registered == name)
                    .map(|(_, handler)| handler.bind(name, value.clone()))
            })
            .collect();
        chain.extend(self.handlers.iter().cloned());
        chain
    }
}

/// The frozen product of a walk.
#[derive(Debug)]
pub struct RouteTable<M = MatchitMatcher> {
    matcher: M,
    routes: Vec<Arc<ResolvedRoute>>,
}

impl<M> RouteTable<M> {
    /// Every registered route, in walk order.
    pub fn routes(&self) -> &[Arc<ResolvedRoute>] {
        &self.routes
    }
}

/// Outcome of a lookup.
#[derive(Debug)]
pub enum Lookup {
    Found(Matched),
    /// The path exists for other methods.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

pub struct Dispatcher<M = MatchitMatcher> {
    tree: RouteTree,
    table: OnceLock<Result<RouteTable<M>, SetupError>>,
}

impl<M> std::fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("nodes", &self.tree.len())
            .field("walked", &self.table.get().is_some())
            .finish()
    }
}

impl<M: PathMatcher> Dispatcher<M> {
    pub fn new(tree: RouteTree) -> Self {
        Self {
            tree,
            table: OnceLock::new(),
        }
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// Build the route table on the first call; later calls return it.
    pub fn walk(&self) -> Result<&RouteTable<M>, SetupError> {
        self.table
            .get_or_init(|| build_table(&self.tree))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn lookup(&self, method: &Method, raw_path: &str) -> Result<Lookup, SetupError> {
        let table = self.walk()?;
        let path = normalize_request_path(raw_path);

        let found = table.matcher.find(method, path).or_else(|| {
            if *method == Method::HEAD {
                table.matcher.find(&Method::GET, path)
            } else {
                None
            }
        });

        if let Some(mut matched) = found {
            for (_, value) in matched.params.iter_mut() {
                *value = percent_decode_str(value).decode_utf8_lossy().into_owned();
            }
            return Ok(Lookup::Found(matched));
        }

        let mut allowed = table.matcher.allowed(path);
        // HEAD is answered by GET routes, so advertise it alongside GET.
        if !allowed.contains(&Method::HEAD) {
            if let Some(get) = allowed.iter().position(|m| *m == Method::GET) {
                allowed.insert(get + 1, Method::HEAD);
            }
        }
        if allowed.is_empty() {
            Ok(Lookup::NotFound)
        } else {
            Ok(Lookup::MethodNotAllowed(allowed))
        }
    }
}

/// `/users/` and `/users` reach the same route.
fn normalize_request_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

fn build_table<M: PathMatcher>(tree: &RouteTree) -> Result<RouteTable<M>, SetupError> {
    let mut matcher = M::default();
    let mut routes = Vec::new();

    for id in tree.walk() {
        let node = tree.node(id);
        let middleware = tree.effective_middleware(id);

        for entry in node.entries() {
            let mut handlers = middleware.to_vec();
            handlers.extend(entry.handlers.iter().cloned());

            let route = Arc::new(ResolvedRoute {
                method: entry.method.clone(),
                path: entry.path.clone(),
                base: node.base().to_string(),
                handlers,
                params: node.params().to_vec(),
            });

            matcher
                .insert(&entry.method, &path::to_pattern(&entry.path), Arc::clone(&route))
                .map_err(|reason| SetupError::RouteConflict {
                    method: entry.method.to_string(),
                    path: entry.path.clone(),
                    reason,
                })?;

            tracing::debug!(
                method = %route.method,
                path = %route.path,
                handlers = route.handlers.len(),
                "Route registered"
            );
            routes.push(route);
        }
    }

    tracing::info!(routes = routes.len(), nodes = tree.len(), "Route table built");
    Ok(RouteTable { matcher, routes })
}
