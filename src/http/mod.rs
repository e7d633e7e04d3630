//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum fallback, tower-http layers)
//!     → routing::Dispatcher (route lookup)
//!     → request/decorate.rs (decorated Request)
//!     → context.rs (RequestContext drives handler.rs `Next`)
//!     → response/ (Response builder over a ResponseSink)
//!     → Send to client
//! ```

pub mod context;
pub mod handler;
pub mod request;
pub mod request_id;
pub mod response;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::RequestContext;
pub use handler::{ChainState, Handler, Next, ParamHandler};
pub use request::Request;
pub use response::{Response, SendBody};
pub use server::{build_router, ServerState, StaticMount};
