//! Router tree.
//!
//! # Responsibilities
//! - Own every router node in an arena addressed by `NodeId`
//! - Record per-node middleware, param handlers and registered entries
//! - Compute each node's effective middleware (ancestors root-first, then
//!   the node's own), memoized per node
//!
//! # Design Decisions
//! - Parent links are plain ids, never owning references
//! - Sibling routers resolving to the same absolute path are rejected
//! - Registering middleware drops every memoized chain, so a cache can
//!   never outlive the middleware it was computed from

use std::sync::OnceLock;

use axum::http::Method;

use crate::error::SetupError;
use crate::http::handler::{Handler, ParamHandler};
use crate::routing::path;

/// The methods `all` registers, in registration order.
pub const ALL_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
];

/// Stable identifier of a node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A registered route entry. Immutable once created.
#[derive(Debug, Clone)]
pub struct Entry {
    pub method: Method,
    /// Absolute path, Express syntax.
    pub path: String,
    /// The entry's own handlers, not yet combined with middleware.
    pub handlers: Vec<Handler>,
}

/// A node of the router tree.
#[derive(Debug)]
pub struct RouteNode {
    base: String,
    parent: Option<NodeId>,
    middleware: Vec<Handler>,
    entries: Vec<Entry>,
    params: Vec<(String, ParamHandler)>,
    children: Vec<(String, NodeId)>,
    effective: OnceLock<Vec<Handler>>,
}

impl RouteNode {
    fn new(base: String, parent: Option<NodeId>) -> Self {
        Self {
            base,
            parent,
            middleware: Vec::new(),
            entries: Vec::new(),
            params: Vec::new(),
            children: Vec::new(),
            effective: OnceLock::new(),
        }
    }

    /// Absolute base path of this node.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Middleware registered directly on this node.
    pub fn middleware(&self) -> &[Handler] {
        &self.middleware
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn params(&self) -> &[(String, ParamHandler)] {
        &self.params
    }

    /// Child nodes in insertion order, keyed by their absolute path.
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(path, id)| (path.as_str(), *id))
    }
}

/// Arena of router nodes. Node 0 is the root, mounted at `/`.
#[derive(Debug)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![RouteNode::new(path::clean(""), None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &RouteNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Mount a child router under `parent`.
    pub fn add_router(&mut self, parent: NodeId, relative: &str) -> Result<NodeId, SetupError> {
        path::validate(relative)?;
        let combined = path::join(&self.nodes[parent.0].base, relative);

        if self.nodes[parent.0]
            .children
            .iter()
            .any(|(existing, _)| *existing == combined)
        {
            return Err(SetupError::PathCollision { path: combined });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(RouteNode::new(combined.clone(), Some(parent)));
        self.nodes[parent.0].children.push((combined, id));
        Ok(id)
    }

    /// Append middleware to a node.
    pub fn add_middleware(&mut self, id: NodeId, handlers: impl IntoIterator<Item = Handler>) {
        self.nodes[id.0].middleware.extend(handlers);
        for node in &mut self.nodes {
            node.effective.take();
        }
    }

    /// Register an entry on a node.
    pub fn add_entry(
        &mut self,
        id: NodeId,
        method: Method,
        relative: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<(), SetupError> {
        path::validate(relative)?;
        let node = &mut self.nodes[id.0];
        let entry = Entry {
            method,
            path: path::join(&node.base, relative),
            handlers: handlers.into_iter().collect(),
        };
        node.entries.push(entry);
        Ok(())
    }

    /// Register a param handler; a later registration for the same name wins.
    pub fn add_param(&mut self, id: NodeId, name: &str, handler: ParamHandler) {
        let params = &mut self.nodes[id.0].params;
        match params.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = handler,
            None => params.push((name.to_string(), handler)),
        }
    }

    /// Ancestor middleware (root first) followed by the node's own.
    pub fn effective_middleware(&self, id: NodeId) -> &[Handler] {
        let node = &self.nodes[id.0];
        match node.parent {
            None => &node.middleware,
            Some(parent) => node.effective.get_or_init(|| {
                let mut chain = self.effective_middleware(parent).to_vec();
                chain.extend(node.middleware.iter().cloned());
                chain
            }),
        }
    }

    /// Depth-first, pre-order traversal; siblings in insertion order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            for (_, child) in self.nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: &'static str) -> Handler {
        Handler::named(tag, |_, _, _| {})
    }

    fn names(handlers: &[Handler]) -> Vec<&str> {
        handlers.iter().map(|h| h.name()).collect()
    }

    #[test]
    fn test_root_is_slash() {
        let tree = RouteTree::new();
        let root = tree.node(tree.root());
        assert_eq!(root.base(), "/");
        assert!(root.is_root());
    }

    #[test]
    fn test_child_paths_are_joined_and_cleaned() {
        let mut tree = RouteTree::new();
        let api = tree.add_router(tree.root(), "api/").unwrap();
        let v1 = tree.add_router(api, "/./v1//").unwrap();

        assert_eq!(tree.node(api).base(), "/api");
        assert_eq!(tree.node(v1).base(), "/api/v1");
        assert_eq!(tree.node(v1).parent(), Some(api));
    }

    #[test]
    fn test_sibling_collision_is_rejected() {
        let mut tree = RouteTree::new();
        let root = tree.root();
        tree.add_router(root, "/api").unwrap();
        let err = tree.add_router(root, "api/").unwrap_err();
        assert_eq!(err, SetupError::PathCollision { path: "/api".into() });
    }

    #[test]
    fn test_empty_paths_are_rejected() {
        let mut tree = RouteTree::new();
        let root = tree.root();
        assert_eq!(tree.add_router(root, ""), Err(SetupError::EmptyPath));
        assert_eq!(
            tree.add_entry(root, Method::GET, "", vec![tagged("h")]),
            Err(SetupError::EmptyPath)
        );
    }

    #[test]
    fn test_effective_middleware_is_root_first() {
        let mut tree = RouteTree::new();
        let root = tree.root();
        let api = tree.add_router(root, "/api").unwrap();
        let users = tree.add_router(api, "/users").unwrap();

        tree.add_middleware(users, vec![tagged("users")]);
        tree.add_middleware(root, vec![tagged("root-1"), tagged("root-2")]);
        tree.add_middleware(api, vec![tagged("api")]);

        assert_eq!(names(tree.effective_middleware(root)), vec!["root-1", "root-2"]);
        assert_eq!(names(tree.effective_middleware(api)), vec!["root-1", "root-2", "api"]);
        assert_eq!(
            names(tree.effective_middleware(users)),
            vec!["root-1", "root-2", "api", "users"]
        );
    }

    #[test]
    fn test_effective_middleware_independent_of_cache_order() {
        let build = || {
            let mut tree = RouteTree::new();
            let root = tree.root();
            let a = tree.add_router(root, "/a").unwrap();
            let b = tree.add_router(a, "/b").unwrap();
            tree.add_middleware(root, vec![tagged("r")]);
            tree.add_middleware(a, vec![tagged("a")]);
            tree.add_middleware(b, vec![tagged("b")]);
            (tree, a, b)
        };

        let (leaf_first, a1, b1) = build();
        let leaf = names(leaf_first.effective_middleware(b1)).join(",");
        let mid = names(leaf_first.effective_middleware(a1)).join(",");

        let (parent_first, a2, b2) = build();
        assert_eq!(names(parent_first.effective_middleware(a2)).join(","), mid);
        assert_eq!(names(parent_first.effective_middleware(b2)).join(","), leaf);
        assert_eq!(leaf, "r,a,b");
    }

    #[test]
    fn test_late_middleware_invalidates_cache() {
        let mut tree = RouteTree::new();
        let root = tree.root();
        let child = tree.add_router(root, "/child").unwrap();
        tree.add_middleware(root, vec![tagged("first")]);
        assert_eq!(names(tree.effective_middleware(child)), vec!["first"]);

        tree.add_middleware(root, vec![tagged("second")]);
        assert_eq!(names(tree.effective_middleware(child)), vec!["first", "second"]);
    }

    #[test]
    fn test_entries_use_absolute_paths() {
        let mut tree = RouteTree::new();
        let api = tree.add_router(tree.root(), "/api").unwrap();
        tree.add_entry(api, Method::GET, "/users/:id", vec![tagged("show")]).unwrap();
        tree.add_entry(api, Method::GET, "/", vec![tagged("index")]).unwrap();

        let entries = tree.node(api).entries();
        assert_eq!(entries[0].path, "/api/users/:id");
        assert_eq!(entries[1].path, "/api");
    }

    #[test]
    fn test_walk_is_depth_first_in_insertion_order() {
        let mut tree = RouteTree::new();
        let root = tree.root();
        let a = tree.add_router(root, "/a").unwrap();
        let b = tree.add_router(root, "/b").unwrap();
        let a1 = tree.add_router(a, "/1").unwrap();

        assert_eq!(tree.walk(), vec![root, a, a1, b]);
    }

    #[test]
    fn test_param_handler_replaced_by_name() {
        let mut tree = RouteTree::new();
        let root = tree.root();
        tree.add_param(root, "id", ParamHandler::new(|_, _, _, _| {}));
        tree.add_param(root, "id", ParamHandler::new(|_, _, _, _| {}));
        tree.add_param(root, "slug", ParamHandler::new(|_, _, _, _| {}));
        assert_eq!(tree.node(root).params().len(), 2);
    }
}
