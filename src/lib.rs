//! Express-style routing and middleware framework on top of axum.
//!
//! # Architecture Overview
//!
//! ```text
//!   setup (single-threaded)                 serving (one task per request)
//!   ───────────────────────                 ──────────────────────────────
//!   App ── routing::Route ──▶ RouteTree     axum fallback (http::server)
//!    │                            │              │
//!    │ build()                    ▼              ▼
//!    └──────────────────▶ Dispatcher::walk ─▶ lookup(method, path)
//!                          (exactly once)        │
//!                                                ▼
//!                              request::decorate ─▶ RequestContext
//!                                                      │ Next::run
//!                                                      ▼
//!                              handlers ─▶ Response ─▶ ResponseSink
//! ```

// Core subsystems
pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod routing;

// Collaborators
pub mod fs;
pub mod view;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use app::{App, Application};
pub use config::{AppConfig, Settings};
pub use error::{
    BodyError, Capability, DecorationError, FileError, RangeError, ResponseError, SetupError,
    TemplateError,
};
pub use http::{Handler, Next, ParamHandler, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::Route;
