//! Handlers and the per-request middleware chain.
//!
//! # Responsibilities
//! - Wrap user closures as cloneable `Handler` / `ParamHandler` values
//! - Drive a request through its remaining handlers (`Next`)
//!
//! # Design Decisions
//! - `Next` is an explicit state machine (remaining handlers plus a state),
//!   never a recursively captured closure
//! - The chain only ever shrinks, so calling `run` from inside a handler
//!   needs no re-entrancy guard
//! - Exhausting the chain is a normal transition that answers 404

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::request::Request;
use crate::http::response::Response;

type HandlerFn = dyn Fn(&mut Response, &mut Request, &mut Next) + Send + Sync;
type ParamHandlerFn = dyn Fn(&mut Response, &mut Request, &mut Next, &str) + Send + Sync;

/// A unit of request processing: `(response, request, next)`.
#[derive(Clone)]
pub struct Handler {
    name: Cow<'static, str>,
    func: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Response, &mut Request, &mut Next) + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed(std::any::type_name::<F>()),
            func: Arc::new(func),
        }
    }

    /// Create a handler with a readable name for route-table logging.
    pub fn named<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&mut Response, &mut Request, &mut Next) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, res: &mut Response, req: &mut Request, next: &mut Next) {
        (self.func)(res, req, next)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

/// A handler keyed by a path parameter name. Receives the parameter value.
#[derive(Clone)]
pub struct ParamHandler {
    func: Arc<ParamHandlerFn>,
}

impl ParamHandler {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Response, &mut Request, &mut Next, &str) + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Bind the handler to a concrete parameter value.
    pub fn bind(&self, name: &str, value: String) -> Handler {
        let func = Arc::clone(&self.func);
        Handler::named(format!("param:{}", name), move |res, req, next| {
            func(res, req, next, &value)
        })
    }
}

impl fmt::Debug for ParamHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamHandler")
    }
}

/// Build a `Vec<Handler>` from closures.
///
/// ```ignore
/// app.get("/", handlers![|res, _req, _next| { res.send("hello"); }])?;
/// ```
#[macro_export]
macro_rules! handlers {
    ($($handler:expr),* $(,)?) => {
        vec![$($crate::http::handler::Handler::new($handler)),*]
    };
}

/// Chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Handlers may still run.
    Pending,
    /// The chain ran dry and the 404 terminal was written.
    Terminated,
}

/// The continuation handed to every handler.
pub struct Next {
    remaining: VecDeque<Handler>,
    state: ChainState,
}

impl Next {
    pub fn new(handlers: impl IntoIterator<Item = Handler>) -> Self {
        Self {
            remaining: handlers.into_iter().collect(),
            state: ChainState::Pending,
        }
    }

    /// Put handlers in front of the remaining chain, keeping their order.
    pub fn prepend(&mut self, handlers: impl IntoIterator<Item = Handler>) {
        let mut front: Vec<Handler> = handlers.into_iter().collect();
        while let Some(handler) = front.pop() {
            self.remaining.push_front(handler);
        }
    }

    /// Advance the chain.
    ///
    /// Pops the head handler and invokes it with `self` as its continuation.
    /// On an empty chain the state becomes `Terminated` and a 404 is sent;
    /// no handler runs.
    pub fn run(&mut self, res: &mut Response, req: &mut Request) {
        if self.state == ChainState::Terminated {
            return;
        }
        match self.remaining.pop_front() {
            Some(handler) => {
                tracing::trace!(handler = handler.name(), "running handler");
                handler.call(res, req, self);
            }
            None => {
                self.state = ChainState::Terminated;
                tracing::debug!(path = %req.path(), "handler chain exhausted");
                res.send_status(StatusCode::NOT_FOUND);
            }
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    pub fn state(&self) -> ChainState {
        self.state
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining.len())
            .field("state", &self.state)
            .finish()
    }
}
