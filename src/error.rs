//! Error taxonomy.
//!
//! # Classes
//! - `SetupError`: route registration and application construction. Fatal.
//! - `DecorationError`: the inbound request could not be decorated (400).
//! - `BodyError`: returned to handlers from the body readers; the handler
//!   decides the HTTP consequence.
//! - `RangeError`: `Range` header parsing.
//! - `FileError`: file transfer failures, delivered through the completion
//!   callback of `send_file`/`download`.
//! - `TemplateError`: template loading and rendering.
//! - `ResponseError`: header validation and optional sink capabilities.
//!
//! # Design Decisions
//! - Every fallible operation returns one of these explicitly
//! - "Not found" at the end of an exhausted chain is a state, not an error

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised while building the route tree or the application.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SetupError {
    /// A route or router was registered with an empty path.
    #[error("route path must not be empty")]
    EmptyPath,

    /// The path contains characters that cannot appear in a route.
    #[error("malformed route path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },

    /// Two sibling routers resolve to the same absolute path.
    #[error("a router is already mounted at {path}")]
    PathCollision { path: String },

    /// The path matcher rejected an entry (duplicate or conflicting pattern).
    #[error("cannot register {method} {path}: {reason}")]
    RouteConflict {
        method: String,
        path: String,
        reason: String,
    },

    /// Templates could not be loaded.
    #[error("template setup failed: {0}")]
    Template(String),

    /// A static mount is invalid.
    #[error("invalid static mount {prefix:?}: {reason}")]
    StaticMount { prefix: String, reason: String },
}

/// Errors raised while decorating an inbound request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecorationError {
    /// The Host header is not a valid authority.
    #[error("malformed Host header {0:?}")]
    MalformedHost(String),
}

impl DecorationError {
    /// Status code used for the terminal response.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Errors returned by the request body readers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BodyError {
    /// The request Content-Type does not match the reader.
    #[error("unsupported media type {received:?}, expected {expected}")]
    UnsupportedMediaType { received: String, expected: String },

    /// The body could not be read or parsed.
    #[error("bad request body: {0}")]
    BadRequest(String),

    /// The body was already read by an earlier reader.
    #[error("request body already consumed")]
    Consumed,
}

impl BodyError {
    /// Conventional status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            BodyError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            BodyError::BadRequest(_) | BodyError::Consumed => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors returned by `Request::range`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RangeError {
    /// The header does not follow the `bytes=start-end,...` grammar.
    #[error("invalid range: {0}")]
    Malformed(String),

    /// No range in the header can be satisfied for the given size.
    #[error("unsatisfiable range")]
    Unsatisfiable,
}

/// Errors delivered to file transfer callbacks.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found")]
    NotFound,

    #[error("specified path is a directory")]
    IsDirectory,

    #[error("serving dotfiles is not allowed")]
    DotfilesDenied,

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the view layer.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template {0} not found")]
    NotFound(String),

    #[error("failed to load templates: {0}")]
    Load(String),

    #[error("failed to render template {name}: {reason}")]
    Render { name: String, reason: String },
}

/// Optional response sink capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Flush,
    Hijack,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Flush => write!(f, "flush"),
            Capability::Hijack => write!(f, "hijack"),
        }
    }
}

/// Errors raised by the response builder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0}")]
    InvalidHeaderValue(String),

    #[error("field {0:?} is not a valid header field name")]
    InvalidVaryField(String),

    #[error("response sink does not support {0}")]
    Unsupported(Capability),

    #[error("response already committed")]
    AlreadyCommitted,

    #[error("client connection closed")]
    Disconnected,

    #[error("cookie secret rejected: {0}")]
    InvalidCookieSecret(String),
}
