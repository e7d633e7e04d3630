//! Registration handle for one router node.
//!
//! A `Route` borrows the tree mutably, so registration is only possible
//! during setup. Child routers are opened with `router`, and an existing
//! node can be reopened later from its `NodeId`.

use axum::http::Method;

use crate::error::SetupError;
use crate::http::handler::{Handler, Next, ParamHandler};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::tree::{NodeId, RouteTree, ALL_METHODS};

#[derive(Debug)]
pub struct Route<'a> {
    tree: &'a mut RouteTree,
    id: NodeId,
}

impl<'a> Route<'a> {
    pub fn new(tree: &'a mut RouteTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Absolute base path of this router.
    pub fn path(&self) -> &str {
        self.tree.node(self.id).base()
    }

    /// Append middleware. Runs for every entry of this router and its
    /// descendants, after any ancestor middleware.
    pub fn use_middleware(&mut self, handlers: impl IntoIterator<Item = Handler>) -> &mut Self {
        self.tree.add_middleware(self.id, handlers);
        self
    }

    /// Register a handler for a path parameter of this router's entries.
    pub fn param<F>(&mut self, name: &str, func: F) -> &mut Self
    where
        F: Fn(&mut Response, &mut Request, &mut Next, &str) + Send + Sync + 'static,
    {
        self.tree.add_param(self.id, name, ParamHandler::new(func));
        self
    }

    /// Mount a child router.
    pub fn router(&mut self, path: &str) -> Result<Route<'_>, SetupError> {
        let id = self.tree.add_router(self.id, path)?;
        tracing::debug!(parent = %self.path(), path = %self.tree.node(id).base(), "Router mounted");
        Ok(Route {
            tree: &mut *self.tree,
            id,
        })
    }

    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<&mut Self, SetupError> {
        self.tree.add_entry(self.id, method, path, handlers)?;
        Ok(self)
    }

    pub fn get(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.handle(Method::GET, path, handlers)
    }

    pub fn post(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.handle(Method::POST, path, handlers)
    }

    pub fn put(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.handle(Method::PUT, path, handlers)
    }

    pub fn delete(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.handle(Method::DELETE, path, handlers)
    }

    pub fn patch(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.handle(Method::PATCH, path, handlers)
    }

    pub fn options(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.handle(Method::OPTIONS, path, handlers)
    }

    pub fn head(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        self.handle(Method::HEAD, path, handlers)
    }

    /// Register the same handlers for every supported method.
    pub fn all(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, SetupError> {
        for method in ALL_METHODS {
            self.handle(method, path, handlers.iter().cloned())?;
        }
        Ok(self)
    }
}
