//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Setup (single-threaded):
//!     Route::{use_middleware, get, post, ..., router, param}
//!     → tree.rs (RouteNode arena, absolute paths via path.rs)
//!
//! First request or Application build:
//!     dispatcher.rs walk()
//!     → effective middleware per node (root first)
//!     → matcher.rs insert(method, pattern, ResolvedRoute)
//!
//! Request:
//!     dispatcher.rs lookup(method, path)
//!     → Found { route, params } | MethodNotAllowed | NotFound
//! ```
//!
//! # Design Decisions
//! - The tree is frozen by moving it into the dispatcher
//! - Deterministic: DFS pre-order, siblings and entries in insertion order
//! - Matcher conflicts abort application construction

pub mod dispatcher;
pub mod matcher;
pub mod path;
pub mod route;
pub mod tree;

pub use dispatcher::{Dispatcher, Lookup, ResolvedRoute, RouteTable};
pub use matcher::{Matched, MatchitMatcher, PathMatcher};
pub use route::Route;
pub use tree::{NodeId, RouteNode, RouteTree, ALL_METHODS};
